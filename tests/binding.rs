use mini_bind::*;
use test_log::test;
use std::cell::RefCell;
use std::rc::Rc;

fn record_events(vm: &ViewModel) -> Rc<RefCell<Vec<String>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    vm.on_property_event(move |event| {
        let tag = match event {
            PropertyEvent::Changing(name) => format!("changing:{name}"),
            PropertyEvent::Changed(name) => format!("changed:{name}"),
        };
        sink.borrow_mut().push(tag);
    });
    events
}

fn pair(name: &str) -> Vec<String> {
    vec![format!("changing:{name}"), format!("changed:{name}")]
}

#[test]
fn observe_captures_the_baseline() {
    let vm = ViewModel::new();
    let events = record_events(&vm);
    let cell = ValueCell::new(10);
    let facade = PropertyFacade::new(&vm, "amount");

    facade.observe(&cell);
    assert_eq!(facade.value(), 10);
    assert_eq!(facade.original_value(), 10);
    assert!(!facade.has_changes().get());
    // attaching renotifies the UI: the current value differs from the
    // facade's previous last-reported value (the type default)
    assert_eq!(&*events.borrow(), &pair("amount"));
}

#[test]
fn edit_reset_and_duplicate_suppression() {
    let vm = ViewModel::new();
    let events = record_events(&vm);
    let cell = ValueCell::new(10);
    let facade = PropertyFacade::new(&vm, "amount");
    facade.observe(&cell);
    events.borrow_mut().clear();

    facade.set_value(15).unwrap();
    assert_eq!(facade.value(), 15);
    assert!(facade.has_changes().get());
    assert_eq!(&*events.borrow(), &pair("amount"));
    events.borrow_mut().clear();

    facade.reset_value().unwrap();
    assert_eq!(facade.value(), 10);
    assert_eq!(facade.original_value(), 10);
    assert!(!facade.has_changes().get());
    assert_eq!(&*events.borrow(), &pair("amount"));
    events.borrow_mut().clear();

    // writing the current value again is suppressed entirely
    facade.set_value(10).unwrap();
    assert!(events.borrow().is_empty());
    assert!(!facade.has_changes().get());
}

#[test]
fn has_changes_is_pushed_only_on_transitions() {
    let vm = ViewModel::new();
    let cell = ValueCell::new(1);
    let facade = PropertyFacade::new(&vm, "count");
    facade.observe(&cell);

    let flags = Rc::new(RefCell::new(Vec::new()));
    let sink = flags.clone();
    let _sub = facade
        .has_changes()
        .subscribe(Rc::new(move |flag: &bool| sink.borrow_mut().push(*flag)));

    facade.set_value(2).unwrap();
    facade.set_value(3).unwrap(); // still dirty: no second push
    facade.set_value(1).unwrap(); // back to the baseline
    assert_eq!(&*flags.borrow(), &vec![false, true, false]);
}

#[test]
fn update_original_value_rebaselines_immediately() {
    let vm = ViewModel::new();
    let cell = ValueCell::new(10);
    let facade = PropertyFacade::new(&vm, "amount");
    facade.observe(&cell);

    facade.set_value(15).unwrap();
    assert!(facade.has_changes().get());

    facade.update_original_value();
    assert_eq!(facade.original_value(), 15);
    assert!(!facade.has_changes().get());

    // the old baseline is now a change
    facade.set_value(10).unwrap();
    assert!(facade.has_changes().get());
}

#[test]
fn unattached_and_disposed_writes_fail() {
    let vm = ViewModel::new();
    let facade = PropertyFacade::<i32>::new(&vm, "x");

    assert_eq!(facade.value(), 0); // unattached reads give the default
    assert_eq!(facade.set_value(1), Err(BindError::NotAttached));

    let cell = ValueCell::new(5);
    facade.observe(&cell);
    facade.dispose();
    assert!(facade.is_disposed());
    assert_eq!(facade.set_value(1), Err(BindError::Disposed));
    assert_eq!(facade.value(), 0);

    // the facade object is reusable: observe attaches anew
    facade.observe(&cell);
    assert!(!facade.is_disposed());
    facade.set_value(1).unwrap();
    assert_eq!(cell.get(), 1);
}

#[test]
fn rebinding_swaps_the_source() {
    let vm = ViewModel::new();
    let events = record_events(&vm);
    let first = ValueCell::new(1);
    let second = ValueCell::new(9);
    let facade = PropertyFacade::new(&vm, "amount");

    facade.observe(&first);
    facade.set_value(5).unwrap();
    assert!(facade.has_changes().get());
    events.borrow_mut().clear();

    facade.observe(&second);
    assert_eq!(facade.value(), 9);
    assert_eq!(facade.original_value(), 9);
    assert!(!facade.has_changes().get());
    assert_eq!(&*events.borrow(), &pair("amount"));

    // the old source is fully detached
    first.set(100);
    assert_eq!(facade.value(), 9);
    assert!(!facade.has_changes().get());
}

#[test]
fn read_only_facade_tracks_a_derived_cell() {
    let vm = ViewModel::new();
    let events = record_events(&vm);
    let cells = vec![ValueCell::new(1), ValueCell::new(2)];
    let total = combine_latest(&cells, |values: &[i32]| values.iter().sum::<i32>());
    let facade = ReadOnlyPropertyFacade::new(&vm, "total");

    facade.observe(&total);
    assert_eq!(facade.value(), 3);
    assert!(!facade.has_changes().get());
    events.borrow_mut().clear();

    cells[0].set(10);
    assert_eq!(facade.value(), 12);
    assert!(facade.has_changes().get());
    assert_eq!(&*events.borrow(), &pair("total"));
}

#[test]
fn none_or_empty_strings_compare_equal() {
    let vm = ViewModel::new();
    let events = record_events(&vm);
    let cell = ValueCell::new(Some(String::new()));
    let facade = PropertyFacade::new(&vm, "note");

    facade.observe_with(&cell, Equality::none_or_empty());
    // Some("") equals the facade's previous last-seen None: nothing fires
    assert!(events.borrow().is_empty());
    assert!(!facade.has_changes().get());

    facade.set_value(None).unwrap();
    assert!(events.borrow().is_empty());
    assert!(!facade.has_changes().get());

    facade.set_value(Some("draft".to_string())).unwrap();
    assert!(facade.has_changes().get());
    assert_eq!(&*events.borrow(), &pair("note"));

    facade.set_value(Some(String::new())).unwrap();
    assert!(!facade.has_changes().get());
}

#[test]
fn change_tracker_aggregates_children() {
    let vm = ViewModel::new();
    let first_cell = ValueCell::new(1);
    let second_cell = ValueCell::new(2);
    let first = PropertyFacade::new(&vm, "first");
    let second = PropertyFacade::new(&vm, "second");
    first.observe(&first_cell);
    second.observe(&second_cell);

    let tracker = ChangeTracker::new();
    tracker.add(first.clone());
    tracker.add(second.clone());
    assert!(!tracker.has_changes().get());

    first.set_value(10).unwrap();
    assert!(tracker.has_changes().get());
    second.set_value(20).unwrap();
    assert!(tracker.has_changes().get());

    first.reset_value().unwrap();
    assert!(tracker.has_changes().get()); // one child still dirty
    second.reset_value().unwrap();
    assert!(!tracker.has_changes().get());
}

#[test]
fn change_tracker_counts_an_initially_dirty_child() {
    let vm = ViewModel::new();
    let cell = ValueCell::new(1);
    let facade = PropertyFacade::new(&vm, "amount");
    facade.observe(&cell);
    facade.set_value(5).unwrap();
    assert!(facade.has_changes().get());

    let tracker = ChangeTracker::new();
    tracker.add(facade.clone());
    assert!(tracker.has_changes().get());

    facade.reset_value().unwrap();
    assert!(!tracker.has_changes().get());
}

#[test]
fn change_tracker_forwards_reset_and_rebaseline() {
    let vm = ViewModel::new();
    let first_cell = ValueCell::new(1);
    let second_cell = ValueCell::new(2);
    let first = PropertyFacade::new(&vm, "first");
    let second = PropertyFacade::new(&vm, "second");
    first.observe(&first_cell);
    second.observe(&second_cell);

    let tracker = ChangeTracker::new();
    tracker.add(first.clone());
    tracker.add(second.clone());

    first.set_value(10).unwrap();
    second.set_value(20).unwrap();
    tracker.reset_value().unwrap();
    assert_eq!(first_cell.get(), 1);
    assert_eq!(second_cell.get(), 2);
    assert!(!tracker.has_changes().get());

    first.set_value(10).unwrap();
    tracker.update_original_value();
    assert!(!tracker.has_changes().get());
    assert_eq!(first.original_value(), 10);
}

#[test]
fn change_trackers_nest() {
    let vm = ViewModel::new();
    let cell = ValueCell::new(1);
    let facade = PropertyFacade::new(&vm, "amount");
    facade.observe(&cell);

    let child = ChangeTracker::new();
    child.add(facade.clone());
    let parent = ChangeTracker::new();
    parent.add(child.clone());

    facade.set_value(5).unwrap();
    assert!(child.has_changes().get());
    assert!(parent.has_changes().get());

    facade.reset_value().unwrap();
    assert!(!parent.has_changes().get());
}

/// Bare dirty flag over a raw cell; unlike a facade it does not dedup its
/// own deliveries.
#[derive(Clone)]
struct RawFlag {
    flag: ValueCell<bool>,
}

impl HasChanges for RawFlag {
    fn has_changes(&self) -> ReadOnlyCell<bool> {
        self.flag.read_only()
    }

    fn reset_value(&self) -> Result<(), BindError> {
        Ok(())
    }

    fn update_original_value(&self) {}
}

#[test]
#[should_panic(expected = "must not be negative")]
fn change_tracker_rejects_a_negative_count() {
    let tracker = ChangeTracker::new();
    let flag = ValueCell::new(false);
    tracker.add(RawFlag { flag: flag.clone() });

    flag.set(true);
    flag.set(false);
    flag.set(false); // a second false would take the count below zero
}

// region work-time example

/// Domain model: working time in hours, with a derived total.
struct WorkTime {
    admin_a: ValueCell<f64>,
    admin_b: ValueCell<f64>,
    non_salary: ValueCell<f64>,
    salary: ValueCell<f64>,
    travel: ValueCell<f64>,
    leave: ValueCell<f64>,
    total: DerivedCell<f64>,
}

impl WorkTime {
    fn new(
        admin_a: f64,
        admin_b: f64,
        non_salary: f64,
        salary: f64,
        travel: f64,
        leave: f64,
    ) -> Self {
        let clip = |_: &f64, new: f64| if new < 0.0 { 0.0 } else { new };
        let admin_a = ValueCell::with_coerce(admin_a, clip);
        let admin_b = ValueCell::with_coerce(admin_b, clip);
        let non_salary = ValueCell::new(non_salary);
        let salary = ValueCell::new(salary);
        let travel = ValueCell::new(travel);
        let leave = ValueCell::with_coerce(leave, clip);
        let inputs = [
            admin_a.clone(),
            admin_b.clone(),
            non_salary.clone(),
            salary.clone(),
            travel.clone(),
            leave.clone(),
        ];
        let total = combine_latest(&inputs, |hours: &[f64]| hours.iter().sum::<f64>());
        WorkTime {
            admin_a,
            admin_b,
            non_salary,
            salary,
            travel,
            leave,
            total,
        }
    }
}

/// Edit view-model: one facade per property, all change-tracked, with the
/// read-only derived total alongside.
struct EditWorkTime {
    vm: ViewModel,
    tracker: ChangeTracker,
    admin_a: PropertyFacade<f64>,
    admin_b: PropertyFacade<f64>,
    non_salary: PropertyFacade<f64>,
    salary: PropertyFacade<f64>,
    travel: PropertyFacade<f64>,
    leave: PropertyFacade<f64>,
    total: ReadOnlyPropertyFacade<f64>,
}

impl EditWorkTime {
    fn new() -> Self {
        let vm = ViewModel::new();
        let tracker = ChangeTracker::new();
        let track = |name: &str| {
            let facade = PropertyFacade::new(&vm, name);
            tracker.add(facade.clone());
            vm.disposables().add(facade.clone());
            facade
        };
        let admin_a = track("admin_a");
        let admin_b = track("admin_b");
        let non_salary = track("non_salary");
        let salary = track("salary");
        let travel = track("travel");
        let leave = track("leave");
        let total = ReadOnlyPropertyFacade::new(&vm, "total");
        vm.disposables().add(total.clone());
        EditWorkTime {
            vm,
            tracker,
            admin_a,
            admin_b,
            non_salary,
            salary,
            travel,
            leave,
            total,
        }
    }

    /// Facades support hot-swapping: loading a new model re-attaches every
    /// property in place.
    fn load(&self, model: &WorkTime) {
        self.admin_a.observe(&model.admin_a);
        self.admin_b.observe(&model.admin_b);
        self.non_salary.observe(&model.non_salary);
        self.salary.observe(&model.salary);
        self.travel.observe(&model.travel);
        self.leave.observe(&model.leave);
        self.total.observe(&model.total);
    }
}

#[test]
fn edit_work_time_end_to_end() {
    let model = WorkTime::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
    let edit = EditWorkTime::new();
    edit.load(&model);

    assert_eq!(edit.total.value(), 21.0);
    assert!(!edit.tracker.has_changes().get());

    edit.salary.set_value(10.0).unwrap();
    assert_eq!(model.salary.get(), 10.0); // written through to the domain
    assert_eq!(edit.total.value(), 27.0); // derived total recomputed
    assert!(edit.tracker.has_changes().get());

    edit.leave.set_value(-2.0).unwrap(); // clipped by the domain cell
    assert_eq!(edit.leave.value(), 0.0);
    assert_eq!(edit.total.value(), 21.0);

    edit.tracker.reset_value().unwrap();
    assert_eq!(model.salary.get(), 4.0);
    assert_eq!(edit.total.value(), 21.0);
    assert!(!edit.tracker.has_changes().get());

    // hot-swap the whole model under the same view-model
    let replacement = WorkTime::new(0.5, 0.5, 1.0, 1.0, 1.0, 1.0);
    edit.load(&replacement);
    assert_eq!(edit.total.value(), 5.0);
    assert_eq!(edit.admin_a.value(), 0.5);
    assert!(!edit.tracker.has_changes().get());

    // closing the view-model detaches everything
    edit.vm.disposables().dispose_all();
    replacement.salary.set(3.0);
    assert_eq!(edit.salary.value(), 0.0); // unattached reads give the default
    assert!(!edit.tracker.has_changes().get());
}

// endregion

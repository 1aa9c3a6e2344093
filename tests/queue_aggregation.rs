use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use usb_stack_config::device::{
    DeviceStackManager, FunctionClass, ParameterEvent, QueueRole,
};
use usb_stack_config::AppError;

/// Sum of every queue depth of every attached instance of `class`
fn brute_force_depth(manager: &DeviceStackManager, class: FunctionClass) -> i64 {
    manager
        .functions()
        .filter(|f| f.class() == class && f.accounting().attached)
        .map(|f| f.queues().roles().filter_map(|r| f.queues().depth(r)).sum::<i64>())
        .sum()
}

#[test]
fn combined_depth_matches_brute_force() {
    for (seed, class) in [(7u64, FunctionClass::Cdc), (11, FunctionClass::Printer)] {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut manager = DeviceStackManager::default();
        let names: Vec<String> = (0..4).map(|_| manager.add(class).unwrap()).collect();
        let roles = class.queue_roles();

        for _ in 0..1000 {
            let name = &names[rng.gen_range(0..names.len())];
            match rng.gen_range(0..10) {
                0 => {
                    if manager.function(name).unwrap().accounting().attached {
                        manager.detach(name).unwrap();
                    } else {
                        manager.attach(name).unwrap();
                    }
                }
                1 => {
                    // Rejected edits leave everything as it was
                    let role = roles[rng.gen_range(0..roles.len())];
                    let result =
                        manager.set_parameter(name, &ParameterEvent::queue(role, 32768));
                    assert!(matches!(result, Err(AppError::OutOfRange { .. })));
                }
                _ => {
                    let role = roles[rng.gen_range(0..roles.len())];
                    let value = rng.gen_range(1..=32767);
                    manager
                        .set_parameter(name, &ParameterEvent::queue(role, value))
                        .unwrap();
                }
            }
            assert_eq!(
                manager.class_totals(class).queue_depth,
                brute_force_depth(&manager, class),
                "seed {}",
                seed
            );
        }
    }
}

#[test]
fn classes_are_aggregated_separately() {
    let mut manager = DeviceStackManager::default();
    let cdc = manager.add_cdc().unwrap();
    let printer = manager.add_printer().unwrap();
    manager.attach(&cdc).unwrap();
    manager.attach(&printer).unwrap();

    manager
        .set_parameter(&cdc, &ParameterEvent::queue(QueueRole::Write, 64))
        .unwrap();
    manager
        .set_parameter(&printer, &ParameterEvent::queue(QueueRole::Read, 16))
        .unwrap();

    assert_eq!(manager.class_totals(FunctionClass::Cdc).queue_depth, 66);
    assert_eq!(manager.class_totals(FunctionClass::Printer).queue_depth, 17);

    // Printers have no serial state notification queue
    let result = manager.set_parameter(
        &printer,
        &ParameterEvent::queue(QueueRole::SerialStateNotification, 4),
    );
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

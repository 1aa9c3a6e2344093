use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use usb_stack_config::config::{DeviceStackConfig, StackConfig};
use usb_stack_config::device::{
    DeviceStackManager, EndpointRole, FunctionClass, SharedTotals, IAD_DESCRIPTOR_SIZE,
};

fn manager_for(processor: &str) -> DeviceStackManager {
    DeviceStackManager::from_config(&StackConfig {
        processor: processor.to_string(),
        ..Default::default()
    })
}

fn zero_totals() -> SharedTotals {
    SharedTotals {
        function_count: 0,
        endpoint_count: 0,
        interface_count: 0,
        config_descriptor_size: 0,
        iad_enabled: false,
    }
}

/// Totals must always equal the recorded shares of attached functions,
/// plus one device-level IAD while two or more functions are attached
fn assert_consistent(manager: &DeviceStackManager) {
    let totals = manager.totals().unwrap();
    let attached: Vec<_> = manager.get_meta().into_iter().filter(|m| m.attached).collect();

    assert_eq!(totals.function_count, attached.len() as i64);
    assert_eq!(totals.iad_enabled, attached.len() >= 2);
    assert_eq!(
        totals.interface_count,
        attached.iter().map(|m| m.contribution.interfaces).sum::<i64>()
    );
    assert_eq!(
        totals.endpoint_count,
        attached.iter().map(|m| m.contribution.endpoints).sum::<i64>()
    );
    let device_iad = if totals.iad_enabled {
        IAD_DESCRIPTOR_SIZE
    } else {
        0
    };
    assert_eq!(
        totals.config_descriptor_size,
        attached
            .iter()
            .map(|m| m.contribution.descriptor_bytes)
            .sum::<i64>()
            + device_iad
    );
}

#[test]
fn random_attach_detach_sequences_are_conserved() {
    for (seed, processor) in [(1u64, "ATSAME70Q21B"), (2, "PIC32MZ2048EFM144"), (3, "ATSAMD21J18A")] {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut manager = manager_for(processor);
        let names: Vec<String> = (0..6)
            .map(|i| {
                if i % 3 == 0 {
                    manager.add_printer().unwrap()
                } else {
                    manager.add_cdc().unwrap()
                }
            })
            .collect();
        // Scope is active and zeroed before the sequence
        assert_eq!(manager.totals().unwrap(), zero_totals());

        for _ in 0..500 {
            let name = &names[rng.gen_range(0..names.len())];
            let attached = manager.function(name).unwrap().accounting().attached;
            if attached {
                manager.detach(name).unwrap();
            } else {
                manager.attach(name).unwrap();
            }
            assert_consistent(&manager);
        }

        for name in &names {
            if manager.function(name).unwrap().accounting().attached {
                manager.detach(name).unwrap();
            }
        }
        assert_eq!(manager.totals().unwrap(), zero_totals(), "seed {}", seed);
        assert_eq!(manager.class_totals(FunctionClass::Cdc).instances, 0);
        assert_eq!(manager.class_totals(FunctionClass::Printer).instances, 0);
    }
}

#[test]
fn n_cdc_instances_are_counted_once_each() {
    let mut manager = manager_for("ATSAME70Q21B");
    let n = 5;
    for _ in 0..n {
        let name = manager.add_cdc().unwrap();
        manager.attach(&name).unwrap();
    }

    let totals = manager.totals().unwrap();
    assert_eq!(totals.function_count, n);
    assert_eq!(totals.interface_count, 2 * n);
    assert_eq!(totals.endpoint_count, 3 * n);
    assert_eq!(manager.class_totals(FunctionClass::Cdc).instances, n);

    // Interface blocks are contiguous and endpoints follow each other
    for (i, meta) in manager.get_meta().iter().enumerate() {
        let i = i as i64;
        assert_eq!(meta.start_interface, 2 * i);
        assert_eq!(meta.endpoints.get(EndpointRole::Interrupt), Some(3 * i + 1));
        assert_eq!(meta.endpoints.get(EndpointRole::BulkIn), Some(3 * i + 3));
    }
}

#[test]
fn device_iad_is_added_exactly_once() {
    let mut manager = manager_for("ATSAME70Q21B");
    let cdc = manager.add_cdc().unwrap();
    manager.attach(&cdc).unwrap();
    let totals = manager.totals().unwrap();
    assert!(!totals.iad_enabled);
    assert_eq!(totals.config_descriptor_size, 58);

    let printer = manager.add_printer().unwrap();
    manager.attach(&printer).unwrap();
    let totals = manager.totals().unwrap();
    assert!(totals.iad_enabled);
    assert_eq!(totals.config_descriptor_size, 58 + 8 + 16);

    // Further functions only add their own bytes
    let printer1 = manager.add_printer().unwrap();
    manager.attach(&printer1).unwrap();
    assert_eq!(manager.totals().unwrap().config_descriptor_size, 82 + 16);

    let cdc1 = manager.add_cdc().unwrap();
    manager.attach(&cdc1).unwrap();
    // The joining CDC carries its own IAD
    assert_eq!(manager.totals().unwrap().config_descriptor_size, 98 + 58 + 8);
    assert_consistent(&manager);
}

#[test]
fn printer_endpoints_depend_on_processor_family() {
    for (processor, endpoints, bulk_out) in [
        ("PIC32MZ2048EFM144", 1, 1),
        ("PIC32MZ1025DAH176", 1, 1),
        ("ATSAME70Q21B", 2, 1),
        ("PIC32MX470F512H", 2, 1),
    ] {
        let mut manager = manager_for(processor);
        let printer = manager.add_printer().unwrap();
        manager.attach(&printer).unwrap();

        assert_eq!(manager.totals().unwrap().endpoint_count, endpoints, "{}", processor);
        let function = manager.function(&printer).unwrap();
        assert_eq!(function.endpoints().get(EndpointRole::BulkOut), Some(bulk_out));
        assert_eq!(function.endpoints().get(EndpointRole::BulkIn), None);
    }
}

#[test]
fn cdc_then_printer_scenario() {
    let mut manager = manager_for("ATSAME70Q21B");
    let cdc = manager.add_cdc().unwrap();
    let printer = manager.add_printer().unwrap();

    manager.attach(&cdc).unwrap();
    let after_cdc = manager.totals().unwrap();
    assert_eq!(after_cdc.function_count, 1);
    assert_eq!(after_cdc.interface_count, 2);
    assert_eq!(after_cdc.endpoint_count, 3);
    assert_eq!(after_cdc.config_descriptor_size, 58);
    let function = manager.function(&cdc).unwrap();
    assert_eq!(function.start_interface(), 0);
    assert_eq!(function.endpoints().get(EndpointRole::Interrupt), Some(1));
    assert_eq!(function.endpoints().get(EndpointRole::BulkOut), Some(2));
    assert_eq!(function.endpoints().get(EndpointRole::BulkIn), Some(3));

    manager.attach(&printer).unwrap();
    let totals = manager.totals().unwrap();
    assert_eq!(totals.function_count, 2);
    assert!(totals.iad_enabled);
    assert_eq!(totals.config_descriptor_size, 82);
    assert_eq!(totals.interface_count, 4);
    assert_eq!(totals.endpoint_count, 5);
    let function = manager.function(&printer).unwrap();
    assert_eq!(function.start_interface(), 2);
    assert_eq!(function.endpoints().get(EndpointRole::BulkOut), Some(4));

    manager.detach(&printer).unwrap();
    assert_eq!(manager.totals().unwrap(), after_cdc);
}

#[test]
fn seeded_iad_flag_does_not_drift() {
    let mut manager = DeviceStackManager::from_config(&StackConfig {
        device: DeviceStackConfig {
            iad_enabled: true,
            ..Default::default()
        },
        ..Default::default()
    });
    let cdc = manager.add_cdc().unwrap();
    let printer = manager.add_printer().unwrap();

    manager.attach(&cdc).unwrap();
    let after_cdc = manager.totals().unwrap();
    assert_eq!(after_cdc.config_descriptor_size, 58);
    assert!(after_cdc.iad_enabled);

    for _ in 0..3 {
        manager.attach(&printer).unwrap();
        assert_eq!(manager.totals().unwrap().config_descriptor_size, 82);
        manager.detach(&printer).unwrap();
        assert_eq!(manager.totals().unwrap(), after_cdc);
    }

    manager.detach(&cdc).unwrap();
    let totals = manager.totals().unwrap();
    assert_eq!(totals.config_descriptor_size, 0);
    assert_eq!(totals.function_count, 0);
    assert!(totals.iad_enabled);
}

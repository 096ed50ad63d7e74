//! ABI check and runtime installation.
//!
//! Installation is process-wide, so the whole sequence lives in one test.

mod common;

use jph::{BridgeOptions, Error, NativeApi, Shape};

unsafe extern "C" fn future_abi() -> u32 {
    // 1.0
    1 << 16
}

unsafe extern "C" fn stale_abi() -> u32 {
    // 0.0
    0
}

#[test]
fn test_init_sequence() {
    assert!(!jph::is_initialized());
    assert!(Shape::sphere(1.0).unwrap_err().is_not_initialized());

    let future = NativeApi {
        abi_version: future_abi,
        ..common::api()
    };
    match jph::init(future, BridgeOptions::default()) {
        Err(Error::IncompatibleAbi { major, minor }) => {
            assert_eq!((major, minor), (1, 0));
        }
        other => panic!("expected IncompatibleAbi, got {:?}", other),
    }

    let stale = NativeApi {
        abi_version: stale_abi,
        ..common::api()
    };
    assert!(matches!(
        jph::init(stale, BridgeOptions::default()),
        Err(Error::IncompatibleAbi { .. })
    ));
    assert!(!jph::is_initialized());

    let options = BridgeOptions {
        registry_capacity: 16,
        token_capacity: 4,
        log_displacements: false,
    };
    jph::init(common::api(), options).expect("compatible engine should install");
    assert!(jph::is_initialized());
    assert!(jph::registry().unwrap().is_empty());
    assert_eq!(jph::tokens().unwrap().live_count(), 0);

    assert!(matches!(
        jph::init(common::api(), BridgeOptions::default()),
        Err(Error::AlreadyInitialized)
    ));

    let sphere = Shape::sphere(1.0).unwrap();
    assert_eq!(jph::registry().unwrap().len(), 1);
    drop(sphere);
    assert!(jph::registry().unwrap().is_empty());
}

use super::*;

#[test]
fn ready_value_is_readable_many_times() {
    let d = Deferred::ready(7u32);
    assert!(d.is_ready());
    assert_eq!(*d.get().unwrap(), 7);
    assert_eq!(*d.clone().get().unwrap(), 7);
}

#[test]
fn reader_blocks_until_writer_resolves() {
    let (promise, d) = deferred::<Vec<u8>>();
    assert!(!d.is_ready());
    assert!(d.get_timeout(Duration::from_millis(10)).is_none());

    let reader = {
        let d = d.clone();
        std::thread::spawn(move || d.get().map(|v| v.len()))
    };
    std::thread::sleep(Duration::from_millis(20));
    promise.set(vec![1, 2, 3]);
    assert_eq!(reader.join().unwrap().unwrap(), 3);
}

#[test]
fn failed_promise_surfaces_error() {
    let (promise, d) = deferred::<u8>();
    promise.fail("gpu lost");
    let err = d.get().unwrap_err();
    assert!(err.to_string().contains("gpu lost"));
}

#[test]
fn dropped_promise_does_not_hang_readers() {
    let (promise, d) = deferred::<u8>();
    drop(promise);
    assert!(d.get().is_err());
}

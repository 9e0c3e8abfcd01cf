use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PanoError::config("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(PanoError::codec("x").to_string().contains("codec error:"));
    assert!(
        PanoError::out_of_memory(&[3], 0, 1)
            .to_string()
            .starts_with("out of memory:")
    );
}

#[test]
fn out_of_memory_lists_dimensions_and_state() {
    let msg = PanoError::out_of_memory(&[3, 4000, 2000], 17, 1024).to_string();
    assert_eq!(
        msg,
        "out of memory: tried to allocate 3 x 4000 x 2000 bytes with usage 17 and limit 1024"
    );

    let msg = PanoError::out_of_memory(&[4096, 1, 1], 0, 10).to_string();
    assert!(msg.contains("allocate 4096 bytes"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PanoError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

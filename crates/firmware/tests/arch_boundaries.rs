//! Architecture boundary tests — run with `cargo test -p firmware --test arch_boundaries`
// Architecture test file: expect/unwrap/panic/indexing are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
//!
//! These tests enforce the layering rules this workspace's `Cargo.toml`
//! dependency graph encodes:
//!
//!   Rule 1: `hal` must not depend on `firmware` (it is the base layer —
//!           everything above it depends down, never up).
//!   Rule 2: the feature layers (`storage`, `bootloader`, `audio-driver`,
//!           `playback`, `alloc-pool`) must not depend on `firmware`.
//!   Rule 3: `storage` must depend only on `hal` — not on `bootloader`,
//!           `audio-driver`, or `playback`.
//!   Rule 4: `bootloader` must depend only on `hal` and `storage` — not
//!           on `audio-driver` or `playback`.
//!
//! # How enforcement works
//!
//! These are compile-time rules a circular path dependency would break:
//! if, say, `hal` gained a path dependency on `firmware`, Cargo would
//! refuse to resolve the workspace graph at all (`firmware` already
//! depends on `hal`), and this test binary — which links the full stack
//! through `firmware`'s dev-dependencies — would fail to build before a
//! single test ran. The functions below name representative public types
//! from each crate; their existence at this link boundary is the proof
//! that the boundary held. A handful also run a small behavioral smoke
//! check, since a boundary test that never executes its subject is easy
//! to leave broken by accident.

/// `hal` must be usable with no `firmware` types in scope.
#[test]
fn hal_is_independent_of_firmware() {
    fn _assert_hal_trait_exists<T: hal::Hal>() {}

    let mut mock = hal::mock::MockHal::new(0);
    assert_eq!(mock.get_ticks_us(), 0, "MockHal must start at tick 0");
    mock.delay_us(10);
    assert_eq!(mock.get_ticks_us(), 10, "delay_us must advance the tick counter");
}

/// `storage` must build and run against only `hal` — proven by
/// constructing a `BlockDevice` directly over a `MockHal` with no
/// `bootloader`/`audio-driver`/`playback` types involved.
#[test]
fn storage_depends_only_on_hal() {
    let mut mock = hal::mock::MockHal::new(8192);
    let mut dev = storage::BlockDevice::new(&mut mock);
    let identify = dev.init().expect("BlockDevice::init over MockHal must succeed");
    assert!(identify.total_sectors > 0, "mock disk must report nonzero sectors");
}

/// `bootloader` must build against `hal` + `storage` only — proven by
/// round-tripping a `BootConfig` record with no `audio-driver`/`playback`
/// types in scope.
#[test]
fn bootloader_depends_only_on_hal_and_storage() {
    let mut cfg = bootloader::BootConfig::defaults();
    cfg.record_attempt_start();
    let encoded = cfg.encode();
    let decoded = bootloader::BootConfig::decode(&encoded).expect("round-trip must decode");
    assert_eq!(decoded.boot_count, cfg.boot_count);
}

/// `audio-driver` must be reachable without any `firmware` application
/// types — naming `Pcf50605`/`Wm8758` at this boundary is the check.
#[test]
fn audio_driver_is_independent_of_firmware() {
    fn _assert_battery_state_exists(_: audio_driver::BatteryState) {}
    fn _assert_wm8758_exists(_: &audio_driver::Wm8758) {}
}

/// `playback` must be reachable without any `firmware` application
/// types, and its engine must behave correctly at this boundary.
#[test]
fn playback_engine_starts_stopped_at_firmware_boundary() {
    let engine = playback::engine::PlaybackEngine::new();
    assert_eq!(engine.state(), playback::engine::PlaybackState::Stopped);
}

/// `alloc-pool` must be reachable without any `firmware` application
/// types, and a fresh allocator must actually hand out a block.
#[test]
fn alloc_pool_is_independent_of_firmware() {
    let mut pool = alloc_pool::FixedBlockAllocator::new();
    let (block, slice) = pool.alloc(64).expect("a fresh 64 B pool must have room for one block");
    assert_eq!(slice.len(), 64);
    pool.free(block);
}

/// The documented boot sequence names every stage from bring-up through
/// `Jump`, in order — this is the seam between `firmware`'s ordering
/// tokens and `bootloader::stage::BootStage`'s names, and it is the one
/// place in this crate that is allowed to know about both.
#[test]
fn firmware_boot_sequence_matches_bootloader_stage_names() {
    assert_eq!(firmware::BOOT_SEQUENCE_STEPS.first(), Some(&"VectorsInstalled"));
    assert_eq!(firmware::BOOT_SEQUENCE_STEPS.last(), Some(&"Jump"));
    assert!(firmware::BOOT_SEQUENCE_STEPS.contains(&"ConfigLoad"));
    assert!(firmware::BOOT_SEQUENCE_STEPS.contains(&"HwCheck"));
}

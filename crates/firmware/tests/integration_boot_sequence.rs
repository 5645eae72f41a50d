//! Integration test: exercises the boot sequence end to end against
//! `hal::mock::MockHal` — no physical PP5021C hardware required.
//!
//! Covers:
//!   1. The bring-up ordering tokens thread through in the documented order.
//!   2. `bootloader::stage::BootStage` advances `ConfigLoad` through
//!      `SuccessSignalled` on an uninterrupted happy path, and falls back
//!      to `Fallback` once the 3-strike budget is exhausted.
//!   3. The click-wheel button-combo override table selects the right
//!      `BootTarget` from a scripted `MockHal` wheel queue.
//!   4. A full FAT32 image — MBR, BPB, FAT, `/.zigpod/firmware.bin` — is
//!      mounted, its header validated, and its body copied and CRC32
//!      verified through `bootloader::loader`.
//!   5. `BootConfig` encode/decode round-trips through a 32-byte buffer,
//!      including the bad-checksum fallback-to-defaults path.
//!
//! Run with: cargo test -p firmware --test integration_boot_sequence

// Integration test file -- intentional test patterns permitted.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use bootloader::stage::{BootStage, StageOutcome};
use bootloader::{BootConfig, BootTarget, FailureReason};
use firmware::boot;
use hal::mock::MockHal;
use hal::Hal;

// -- Bring-up ordering -----------------------------------------------------

#[test]
fn bring_up_tokens_reach_system_ready_on_mock_hal() {
    let mut mock = MockHal::new(0);
    let vectors = boot::install_vectors_stub();
    let stacks = boot::assign_stacks_stub(vectors);
    let bss = boot::zero_bss_stub(stacks);
    boot::init_system(bss, &mut mock).expect("system_init must succeed on MockHal");
}

// -- BootStage state machine -----------------------------------------------

#[test]
fn happy_path_reaches_success_signalled_in_ten_steps() {
    let cfg = BootConfig::defaults();
    let mut stage = BootStage::BootRom;
    let mut steps = 0;
    while stage != BootStage::SuccessSignalled {
        stage = stage.advance(StageOutcome::Continue, &cfg);
        steps += 1;
        assert!(steps <= firmware::BOOT_SEQUENCE_STEPS.len(), "stage machine did not converge");
    }
    assert_eq!(steps, firmware::BOOT_SEQUENCE_STEPS.len());
}

#[test]
fn repeated_hw_check_failures_force_fallback_on_the_third_strike() {
    let mut cfg = BootConfig::defaults();
    let mut stage = BootStage::HwCheck;

    for attempt in 1..=3u16 {
        cfg.record_attempt_start();
        assert_eq!(cfg.consecutive_failures, attempt);
        stage = stage.advance(StageOutcome::Fail(FailureReason::HwCheck), &cfg);
        cfg.record_failure(FailureReason::HwCheck);
        if attempt < 3 {
            assert_eq!(stage, BootStage::BootRom, "below the 3-strike budget, retry from BootRom");
            stage = BootStage::HwCheck;
        } else {
            assert_eq!(stage, BootStage::Fallback, "third consecutive failure must force fallback");
        }
    }
}

// -- Button-combo override --------------------------------------------------

fn push_combo(mock: &mut MockHal, bits: u32, packets: usize) {
    let status = hal::regs::WHEEL_STATUS_READY_BIT | bits;
    let data = u32::from(hal::regs::WHEEL_VALIDATION_BYTE);
    for _ in 0..packets {
        mock.push_wheel_packet(status, data);
    }
}

#[test]
fn idle_wheel_keeps_the_configured_default_target() {
    let mut mock = MockHal::new(0);
    let cfg = BootConfig::defaults();
    let target = boot::sample_button_override(&mut mock).unwrap_or(cfg.default_boot_target);
    assert_eq!(target, BootTarget::ZigPod);
}

#[test]
fn held_select_alone_selects_safe_mode() {
    let mut mock = MockHal::new(0);
    // Select is bit 8 (see hal::clickwheel::decode_mask).
    push_combo(&mut mock, 1 << 8, 150);
    assert_eq!(boot::sample_button_override(&mut mock), Some(BootTarget::Safe));
}

#[test]
fn held_menu_and_select_selects_recovery_not_just_apple() {
    let mut mock = MockHal::new(0);
    // Menu is bit 12, Select is bit 8 — held together past the 5 s threshold.
    push_combo(&mut mock, (1 << 12) | (1 << 8), 260);
    assert_eq!(boot::sample_button_override(&mut mock), Some(BootTarget::Recovery));
}

// -- BootConfig persistence round trip --------------------------------------

#[test]
fn boot_config_round_trips_through_its_encoded_form() {
    let mut cfg = BootConfig::defaults();
    cfg.default_boot_target = BootTarget::Safe;
    cfg.record_attempt_start();
    cfg.record_failure(FailureReason::Watchdog);

    let encoded = cfg.encode();
    let decoded = BootConfig::decode(&encoded).expect("a freshly encoded record must decode");
    assert_eq!(decoded.default_boot_target, BootTarget::Safe);
    assert_eq!(decoded.consecutive_failures, cfg.consecutive_failures);
    assert_eq!(decoded.last_failure_reason, FailureReason::Watchdog);
}

#[test]
fn a_corrupted_record_falls_back_to_defaults() {
    let cfg = BootConfig::defaults();
    let mut encoded = cfg.encode();
    encoded[0] ^= 0xFF; // flip a byte inside the checksummed payload
    let recovered = BootConfig::load_or_default(&encoded);
    assert_eq!(recovered.default_boot_target, BootConfig::defaults().default_boot_target);
}

// -- Full image mount/load/verify -------------------------------------------

/// Build a `MockHal`-backed disk with a single FAT32 partition containing
/// `/.zigpod/firmware.bin`, mirroring `bootloader::loader`'s own test
/// fixture but exercised here at the `firmware` integration boundary.
fn build_disk_with_firmware_image(body: &[u8]) -> MockHal {
    let mut mock = MockHal::new(8 * 1024 * 1024);
    {
        let disk = mock.disk_mut();

        let mbr = &mut disk[0..512];
        mbr[446 + 4] = 0x0B;
        mbr[446 + 8..446 + 12].copy_from_slice(&1u32.to_le_bytes());
        mbr[446 + 12..446 + 16].copy_from_slice(&4096u32.to_le_bytes());
        mbr[510] = 0x55;
        mbr[511] = 0xAA;

        let bpb = &mut disk[512..1024];
        bpb[11..13].copy_from_slice(&512u16.to_le_bytes());
        bpb[13] = 1;
        bpb[14..16].copy_from_slice(&1u16.to_le_bytes());
        bpb[16] = 1;
        bpb[17..19].copy_from_slice(&0u16.to_le_bytes());
        bpb[22..24].copy_from_slice(&0u16.to_le_bytes());
        bpb[32..36].copy_from_slice(&4096u32.to_le_bytes());
        bpb[36..40].copy_from_slice(&8u32.to_le_bytes());
        bpb[44..48].copy_from_slice(&2u32.to_le_bytes());

        let fat = &mut disk[1024..1536];
        fat[8..12].copy_from_slice(&0x0FFF_FFFFu32.to_le_bytes());
        fat[16..20].copy_from_slice(&0x0FFF_FFFFu32.to_le_bytes());
        fat[20..24].copy_from_slice(&0x0FFF_FFFFu32.to_le_bytes());

        let root_dir = &mut disk[10 * 512..10 * 512 + 512];
        root_dir[0..11].copy_from_slice(b".ZIGPOD    ");
        root_dir[11] = 0x10;
        root_dir[26..28].copy_from_slice(&4u16.to_le_bytes());

        let zigpod_dir = &mut disk[12 * 512..12 * 512 + 512];
        zigpod_dir[0..11].copy_from_slice(b"FIRMWAREBIN");
        zigpod_dir[11] = 0x00;
        zigpod_dir[26..28].copy_from_slice(&5u16.to_le_bytes());
        let total_len = (bootloader::ImageHeader::SIZE + body.len()) as u32;
        zigpod_dir[28..32].copy_from_slice(&total_len.to_le_bytes());

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(body);
        let header = bootloader::ImageHeader {
            version: (1, 0, 0),
            flags: 0,
            entry_point: bootloader::DRAM_START,
            load_address: bootloader::DRAM_START,
            firmware_size: body.len() as u32,
            body_checksum: hasher.finalize(),
            signature: [0u8; 64],
            build_timestamp: 0,
            min_bootloader_version: 1,
        };
        let file_data = &mut disk[13 * 512..13 * 512 + 512];
        file_data[0..bootloader::ImageHeader::SIZE].copy_from_slice(&header.encode());
        file_data[bootloader::ImageHeader::SIZE..bootloader::ImageHeader::SIZE + body.len()]
            .copy_from_slice(body);
    }
    mock
}

#[test]
fn full_image_load_mounts_reads_copies_and_verifies() {
    let body = b"a tiny stand-in for a resident firmware image";
    let mut mock = build_disk_with_firmware_image(body);
    let mut dev = storage::BlockDevice::new(&mut mock);

    let mut mount = bootloader::mount_data_partition(&mut dev).expect("mount must succeed");
    let (mut file, header) =
        bootloader::read_image_header(&mut mount, &mut dev).expect("header must validate");
    assert_eq!(header.firmware_size as usize, body.len());

    let mut dest = [0u8; 128];
    bootloader::copy_and_verify_body(&mut mount, &mut dev, &mut file, &header, &mut dest)
        .expect("body copy + CRC32 verify must succeed");
    assert_eq!(&dest[..body.len()], body);
}

#[test]
fn a_tampered_body_fails_crc32_verification() {
    let body = b"untampered body bytes";
    let mut mock = build_disk_with_firmware_image(body);
    {
        // Flip a byte in the file's body region (after the 256-byte header).
        let disk = mock.disk_mut();
        let offset = 13 * 512 + bootloader::ImageHeader::SIZE;
        disk[offset] ^= 0xFF;
    }
    let mut dev = storage::BlockDevice::new(&mut mock);
    let mut mount = bootloader::mount_data_partition(&mut dev).expect("mount must succeed");
    let (mut file, header) =
        bootloader::read_image_header(&mut mount, &mut dev).expect("header must validate");

    let mut dest = [0u8; 128];
    let result =
        bootloader::copy_and_verify_body(&mut mount, &mut dev, &mut file, &header, &mut dest);
    assert!(result.is_err(), "a tampered body must fail CRC32 verification");
}

//! ZigPod firmware — application layer for the iPod Classic 5th/5.5th-gen
//! hardware running PortalPlayer PP5021C.
//!
//! # Architecture
//!
//! ```text
//! Application Layer (this crate: boot stub, main loop, audio engine glue)
//!         ↓
//! Feature Layers (bootloader, storage, playback, audio-driver, alloc-pool)
//!         ↓
//! Hardware Abstraction (hal crate — the Hal trait)
//!         ↓
//! Silicon (PP5021C MMIO) or Mock (host tests)
//! ```
//!
//! There is no MMU, no cache, and no async executor on this target: both
//! ARM7TDMI cores run bare, and every peripheral access in [`hal::Hal`]
//! either completes immediately or busy-waits bounded by a timeout. This
//! crate is the only layer that is allowed to know about the boot stub,
//! the main-loop shape, and which button combination maps to which boot
//! target — everything below it is reusable outside a ZigPod-branded
//! build.
//!
//! # Features
//!
//! - `hardware` — build for the `armv4t-none-eabi` target (raw MMIO,
//!   `defmt`/`defmt-rtt` logging, `panic-probe`).
//! - `std` — host test builds (`hal::mock::MockHal`).

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audio_engine;
pub mod boot;
pub mod dma_buffer;
pub mod exception_handlers;
pub mod fault;
pub mod frame_limiter;
pub mod main_loop;
pub mod power;

pub use audio_engine::AudioEngine;
pub use boot::BOOT_SEQUENCE_STEPS;
pub use fault::FaultInfo;
pub use frame_limiter::FrameLimiter;
pub use main_loop::MainLoop;

//! PP5021C MMIO memory map.
//!
//! Every address the silicon backend touches is named here as a `const
//! u32`. The mock backend never reads these constants; they exist purely
//! so the silicon backend has no raw pointer literal anywhere outside
//! this module.

/// Boot mask ROM, 128 KB.
pub const BOOT_ROM_BASE: u32 = 0x0000_0000;
/// End of boot ROM (inclusive).
pub const BOOT_ROM_END: u32 = 0x0001_FFFF;

/// Internal 96 KB IRAM.
pub const IRAM_BASE: u32 = 0x1000_0000;
/// End of IRAM (inclusive).
pub const IRAM_END: u32 = 0x1001_7FFF;

/// BCM2722 LCD/video controller window.
pub const LCD_BASE: u32 = 0x3000_0000;
/// End of the LCD controller window (inclusive).
pub const LCD_END: u32 = 0x3007_0000;
/// LCD parameter-stream write address.
pub const LCD_PARAM_ADDR: u32 = 0x000E_0000;
/// LCD command register address.
pub const LCD_CMD_ADDR: u32 = 0x0000_01F8;
/// BCM control register, written to trigger a transfer.
pub const BCM_CONTROL: u32 = 0x0000_0031;

/// Core system/clock/IRQ/timer/GPIO block.
pub const SYSTEM_BASE: u32 = 0x6000_0000;
/// End of the core system block (inclusive).
pub const SYSTEM_END: u32 = 0x6000_7FFF;

/// DMA controller, 4 channels. Master/status register at this address.
pub const DMA_BASE: u32 = 0x6000_A000;
/// End of the DMA controller block (inclusive).
pub const DMA_END: u32 = 0x6000_BFFF;

/// GPIO ports A–L base; per-port registers live at `+4 * port_index`.
pub const GPIO_BASE: u32 = 0x6000_D000;
/// End of the GPIO block (inclusive).
pub const GPIO_END: u32 = 0x6000_D1FF;

/// Device-init block: PP version ID, INIT1/INIT2 clock-enable registers.
pub const DEV_INIT_BASE: u32 = 0x7000_0000;
/// End of the device-init block (inclusive).
pub const DEV_INIT_END: u32 = 0x7000_0FFF;

/// I2S controller: IISCONFIG, IISCLK, IISFIFO.
pub const I2S_BASE: u32 = 0x7000_2800;
/// End of the I2S controller block (inclusive).
pub const I2S_END: u32 = 0x7000_28FF;

/// UART0/UART1, 16550-compatible.
pub const UART_BASE: u32 = 0x7000_6000;
/// End of the UART block (inclusive).
pub const UART_END: u32 = 0x7000_607F;

/// I2C controller, 400 kHz fast mode.
pub const I2C_BASE: u32 = 0x7000_C000;
/// End of the I2C controller block (inclusive).
pub const I2C_END: u32 = 0x7000_C0FF;

/// Click-wheel controller: WHEEL_CTRL, WHEEL_STATUS, WHEEL_DATA.
pub const WHEEL_BASE: u32 = 0x7000_C100;
/// End of the click-wheel block (inclusive).
pub const WHEEL_END: u32 = 0x7000_C1FF;
/// Magic configuration word 1, written during wheel init.
pub const WHEEL_MAGIC_1: u32 = 0xC00A_1F00;
/// Magic configuration word 2, written during wheel init.
pub const WHEEL_MAGIC_2: u32 = 0x0100_0000;
/// Status register bit that indicates a new packet is ready.
pub const WHEEL_STATUS_READY_BIT: u32 = 1 << 26;
/// Low byte every valid wheel packet must carry.
pub const WHEEL_VALIDATION_BYTE: u8 = 0x1A;

/// ATA/IDE PIO task file.
pub const ATA_BASE: u32 = 0xC300_0000;
/// End of the ATA/IDE PIO task file (inclusive).
pub const ATA_END: u32 = 0xC300_01FF;

/// USB device controller.
pub const USB_BASE: u32 = 0xC500_0000;
/// End of the USB device controller block (inclusive).
pub const USB_END: u32 = 0xC5FF_FFFF;

/// Cached alias of the 32 MB SDRAM.
pub const SDRAM_CACHED_BASE: u32 = 0x4000_0000;
/// End of the cached SDRAM alias (inclusive).
pub const SDRAM_CACHED_END: u32 = 0x41FF_FFFF;
/// Uncached alias of the same 32 MB SDRAM, used for DMA buffers.
pub const SDRAM_UNCACHED_BASE: u32 = 0x4200_0000;
/// End of the uncached SDRAM alias (inclusive).
pub const SDRAM_UNCACHED_END: u32 = 0x43FF_FFFF;

/// DMA request id for the I2S peripheral.
pub const DMA_REQUEST_I2S: u8 = 2;
/// DMA request id for the SDHC/ATA peripheral.
pub const DMA_REQUEST_SDHC: u8 = 13;

/// WM8758 I2C address.
pub const WM8758_I2C_ADDR: u8 = 0x1A;
/// WM8758 I2C bus clock, 400 kHz fast mode.
pub const WM8758_I2C_FREQ_HZ: u32 = 400_000;

/// PCF50605 PMU I2C address.
pub const PCF50605_I2C_ADDR: u8 = 0x08;

// ── Sub-block offsets for the silicon backend ───────────────────────────
//
// The blocks above name the MMIO window each peripheral lives in; these
// name the individual registers within those windows that
// `hal::hardware` pokes directly.

/// Free-running microsecond tick counter, offset from [`SYSTEM_BASE`].
pub const TIMER_USEC_OFFSET: u32 = 0x00C0;
/// Watchdog control/kick register, offset from [`SYSTEM_BASE`].
pub const WATCHDOG_OFFSET: u32 = 0x00C8;
/// CPU clock-scaling PLL select register, offset from [`SYSTEM_BASE`].
pub const CPU_CLOCK_OFFSET: u32 = 0x00CC;
/// Low-power wait-for-interrupt trigger register, offset from [`SYSTEM_BASE`].
pub const SLEEP_OFFSET: u32 = 0x00D0;
/// Software reset trigger register, offset from [`SYSTEM_BASE`].
pub const RESET_OFFSET: u32 = 0x00D4;

/// Per-port direction register bank, offset from [`GPIO_BASE`] (add
/// [`crate::gpio::PinId::port_offset`] for a given port).
pub const GPIO_DIR_OFFSET: u32 = 0x0000;
/// Per-port output-level register bank, offset from [`GPIO_BASE`].
pub const GPIO_OUTPUT_OFFSET: u32 = 0x0020;
/// Per-port input-level register bank, offset from [`GPIO_BASE`].
pub const GPIO_INPUT_OFFSET: u32 = 0x0040;
/// Per-port edge-interrupt-enable register bank, offset from [`GPIO_BASE`].
pub const GPIO_INT_ENABLE_OFFSET: u32 = 0x0060;

/// I2C control register, offset from [`I2C_BASE`].
pub const I2C_CONTROL_OFFSET: u32 = 0x00;
/// I2C status register, offset from [`I2C_BASE`].
pub const I2C_STATUS_OFFSET: u32 = 0x04;
/// I2C target-address register, offset from [`I2C_BASE`].
pub const I2C_ADDR_OFFSET: u32 = 0x08;
/// I2C data register (write pushes, read pops), offset from [`I2C_BASE`].
pub const I2C_DATA_OFFSET: u32 = 0x0C;
/// I2C clock-divider register, offset from [`I2C_BASE`].
pub const I2C_CLOCK_DIV_OFFSET: u32 = 0x10;
/// Status bit set once the addressed device has acknowledged.
pub const I2C_STATUS_ACK_BIT: u32 = 1 << 0;
/// Status bit set while a transfer is still in flight.
pub const I2C_STATUS_BUSY_BIT: u32 = 1 << 1;

/// I2S configuration register (sample width, mode), offset from [`I2S_BASE`].
pub const IIS_CONFIG_OFFSET: u32 = 0x00;
/// I2S clock-divider register, offset from [`I2S_BASE`].
pub const IIS_CLOCK_OFFSET: u32 = 0x04;
/// I2S TX FIFO data register, offset from [`I2S_BASE`].
pub const IIS_FIFO_OFFSET: u32 = 0x08;
/// I2S FIFO status register (free-slot count in the low byte), offset
/// from [`I2S_BASE`].
pub const IIS_FIFO_STATUS_OFFSET: u32 = 0x0C;
/// I2S TX FIFO depth in stereo samples.
pub const IIS_FIFO_DEPTH: usize = 16;

/// Click-wheel control register, offset from [`WHEEL_BASE`] — the magic
/// configuration words are written here during [`crate::Hal::wheel_init`].
pub const WHEEL_CTRL_OFFSET: u32 = 0x00;
/// Click-wheel status register, offset from [`WHEEL_BASE`].
pub const WHEEL_STATUS_OFFSET: u32 = 0x04;
/// Click-wheel data register, offset from [`WHEEL_BASE`].
pub const WHEEL_DATA_OFFSET: u32 = 0x08;

/// Per-channel register stride within [`DMA_BASE`].
pub const DMA_CHANNEL_STRIDE: u32 = 0x20;
/// DMA channel control register, offset within a channel's stride.
pub const DMA_CONTROL_OFFSET: u32 = 0x00;
/// DMA channel source-address register, offset within a channel's stride.
pub const DMA_SRC_ADDR_OFFSET: u32 = 0x04;
/// DMA channel transfer-length register, offset within a channel's stride.
pub const DMA_LEN_OFFSET: u32 = 0x08;
/// DMA channel request-id register, offset within a channel's stride.
pub const DMA_REQUEST_ID_OFFSET: u32 = 0x0C;
/// DMA channel status register, offset within a channel's stride.
pub const DMA_STATUS_OFFSET: u32 = 0x10;
/// Status bit set while the channel's transfer is in flight.
pub const DMA_STATUS_BUSY_BIT: u32 = 1 << 0;
/// Control-register bit that arms and starts the configured transfer.
pub const DMA_CONTROL_START_BIT: u32 = 1 << 0;
/// Control-register bit that aborts an in-flight transfer.
pub const DMA_CONTROL_ABORT_BIT: u32 = 1 << 1;

/// ATA PIO task-file register offsets, offset from [`ATA_BASE`] (standard
/// IDE task-file layout).
pub const ATA_DATA_OFFSET: u32 = 0x00;
/// ATA sector-count register.
pub const ATA_SECCOUNT_OFFSET: u32 = 0x02;
/// ATA LBA low byte register.
pub const ATA_LBA_LOW_OFFSET: u32 = 0x03;
/// ATA LBA mid byte register.
pub const ATA_LBA_MID_OFFSET: u32 = 0x04;
/// ATA LBA high byte register.
pub const ATA_LBA_HIGH_OFFSET: u32 = 0x05;
/// ATA device/head select register.
pub const ATA_DEVICE_OFFSET: u32 = 0x06;
/// ATA command/status register (write: command, read: status).
pub const ATA_COMMAND_OFFSET: u32 = 0x07;
/// Status bit set while the device is busy.
pub const ATA_STATUS_BUSY_BIT: u8 = 1 << 7;
/// Status bit set once the device is ready for a data transfer.
pub const ATA_STATUS_DRQ_BIT: u8 = 1 << 3;
/// IDENTIFY DEVICE command code.
pub const ATA_CMD_IDENTIFY: u8 = 0xEC;
/// READ SECTORS command code.
pub const ATA_CMD_READ_SECTORS: u8 = 0x20;
/// WRITE SECTORS command code.
pub const ATA_CMD_WRITE_SECTORS: u8 = 0x30;
/// FLUSH CACHE command code.
pub const ATA_CMD_FLUSH_CACHE: u8 = 0xE7;
/// STANDBY IMMEDIATE command code.
pub const ATA_CMD_STANDBY_IMMEDIATE: u8 = 0xE0;

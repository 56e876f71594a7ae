use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_SCALE: u16 = 1;
pub const DEFAULT_FG: Rgba = Rgba(0xffff_ffff);
pub const DEFAULT_BG: Rgba = Rgba(0x0000_00ff);
pub const DEFAULT_IPS: u32 = 700;

/// Command line options.
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Params {
    /// Path to the ROM to run
    pub rom: PathBuf,

    /// Terminal cells per CHIP-8 pixel
    #[arg(short, long, default_value_t = DEFAULT_SCALE, value_parser = clap::value_parser!(u16).range(1..=8))]
    pub scale: u16,

    /// Foreground color as hex RRGGBBAA (or RRGGBB)
    #[arg(long, default_value = "FFFFFFFF")]
    pub fg: Rgba,

    /// Background color as hex RRGGBBAA (or RRGGBB)
    #[arg(long, default_value = "000000FF")]
    pub bg: Rgba,

    /// Draw a background-colored border round each lit pixel
    #[arg(long)]
    pub outline: bool,

    /// Instructions executed per second
    #[arg(short, long, default_value_t = DEFAULT_IPS, value_parser = clap::value_parser!(u32).range(1..))]
    pub ips: u32,

    /// FX55/FX65 leave I pointing past the last register touched
    #[arg(long)]
    pub load_store_increments_index: bool,

    /// FX1E sets VF when I runs past the end of memory
    #[arg(long)]
    pub index_overflow_sets_flag: bool,

    /// Beep through the host speaker while the sound timer runs
    #[arg(long)]
    pub beep: bool,
}

/// An RGBA color packed as 0xRRGGBBAA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u32);

impl Rgba {
    pub fn channels(&self) -> (u8, u8, u8, u8) {
        let [r, g, b, a] = self.0.to_be_bytes();
        (r, g, b, a)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid color {0:?}, expected hex RRGGBB or RRGGBBAA")]
pub struct ParseRgbaError(String);

impl FromStr for Rgba {
    type Err = ParseRgbaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseRgbaError(s.to_string()));
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| ParseRgbaError(s.to_string()))?;
        match hex.len() {
            6 => Ok(Rgba(value << 8 | 0xff)),
            8 => Ok(Rgba(value)),
            _ => Err(ParseRgbaError(s.to_string())),
        }
    }
}

/// How the frame buffer is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub scale: u16,
    pub fg: Rgba,
    pub bg: Rgba,
    pub outline: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            scale: DEFAULT_SCALE,
            fg: DEFAULT_FG,
            bg: DEFAULT_BG,
            outline: false,
        }
    }
}

/// Places where historical interpreters disagree. By default I is left alone
/// by FX55/FX65 and FX1E never touches VF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quirks {
    /// FX55/FX65 add X+1 to I afterwards
    pub load_store_increments_index: bool,
    /// FX1E sets VF to 1 if I+VX > 0x0FFF, else 0
    pub index_overflow_sets_flag: bool,
}

/// Everything the machine and its front end need to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rom: PathBuf,
    pub render: RenderConfig,
    pub ips: u32,
    pub quirks: Quirks,
    pub beep: bool,
}

impl From<Params> for Config {
    fn from(p: Params) -> Self {
        Config {
            rom: p.rom,
            render: RenderConfig {
                scale: p.scale,
                fg: p.fg,
                bg: p.bg,
                outline: p.outline,
            },
            ips: p.ips,
            quirks: Quirks {
                load_store_increments_index: p.load_store_increments_index,
                index_overflow_sets_flag: p.index_overflow_sets_flag,
            },
            beep: p.beep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_rgba() {
        assert_eq!("FF8000C0".parse(), Ok(Rgba(0xff80_00c0)));
        assert_eq!("#ff8000".parse(), Ok(Rgba(0xff80_00ff)));
        assert_eq!("0x00000000".parse(), Ok(Rgba(0)));
        assert!("fff".parse::<Rgba>().is_err());
        assert!("+ffffff".parse::<Rgba>().is_err());
        assert!("ggggggff".parse::<Rgba>().is_err());
    }

    #[test]
    fn test_channels() {
        assert_eq!(Rgba(0x1122_3344).channels(), (0x11, 0x22, 0x33, 0x44));
        assert_eq!(Rgba(0x1122_3344).to_string(), "11223344");
    }

    #[test]
    fn test_defaults() {
        let p = Params::try_parse_from(["chip8vm", "game.ch8"]).unwrap();
        let c = Config::from(p);
        assert_eq!(c.rom, PathBuf::from("game.ch8"));
        assert_eq!(c.render, RenderConfig::default());
        assert_eq!(c.ips, 700);
        assert_eq!(c.quirks, Quirks::default());
        assert!(!c.beep);
    }

    #[test]
    fn test_all_options() {
        let p = Params::try_parse_from([
            "chip8vm",
            "-s",
            "3",
            "--fg",
            "#00ff00",
            "--bg",
            "102030ff",
            "--outline",
            "--ips",
            "1200",
            "--load-store-increments-index",
            "--index-overflow-sets-flag",
            "--beep",
            "pong.ch8",
        ])
        .unwrap();
        let c = Config::from(p);
        assert_eq!(
            c.render,
            RenderConfig {
                scale: 3,
                fg: Rgba(0x00ff_00ff),
                bg: Rgba(0x1020_30ff),
                outline: true,
            }
        );
        assert_eq!(c.ips, 1200);
        assert!(c.quirks.load_store_increments_index);
        assert!(c.quirks.index_overflow_sets_flag);
        assert!(c.beep);
    }

    #[test]
    fn test_rom_is_required() {
        assert!(Params::try_parse_from(["chip8vm"]).is_err());
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(Params::try_parse_from(["chip8vm", "--ips", "0", "a.ch8"]).is_err());
        assert!(Params::try_parse_from(["chip8vm", "--scale", "9", "a.ch8"]).is_err());
        assert!(Params::try_parse_from(["chip8vm", "--fg", "red", "a.ch8"]).is_err());
    }
}

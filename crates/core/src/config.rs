//! Release constants for Hibizukai Sans builds.

use crate::font::EmMetrics;

/// Default basename of the Japanese-script source (BIZ UDPGothic).
pub const JA_FONT_BASENAME: &str = "original/BIZUDGothic/BIZUDPGothic";

/// Default basename of the Latin source (Inter).
pub const EN_FONT_BASENAME: &str = "original/Inter/Inter";

/// Default output directory.
pub const BUILD_DIR: &str = "HibizukaiSans";

/// Family name of the released font.
pub const RELEASE_FAMILYNAME: &str = "HibizukaiSans";

/// OS/2 vendor tag.
pub const VENDOR_ID: [u8; 4] = *b"HBZS";

/// Extension of the source fonts and of the release binary.
pub const FONT_EXTENSION: &str = "ttf";

pub const COPYRIGHT: &str = "Copyright 2022 The BIZ UDGothic Project Authors (https://github.com/googlefonts/morisawa-biz-ud-gothic)\n\
Copyright 2016 The Inter Project Authors (https://github.com/rsms/inter)\n\
Copyright 2025 ggl329 (https://github.com/ggl329/hibizukai-sans)\n";

pub const TRADEMARK: &str =
    "BIZ UDGothic is a trademark of Morisawa Inc., Inter UI and Inter is a trademark of rsms.";

pub const MANUFACTURER: &str = "Morisawa Inc., rsms";

pub const DESIGNER: &str = "TypeBank Co., Ltd., Rasmus Andersson";

pub const LICENSE: &str = "This Font Software is licensed under the SIL Open Font License, Version 1.1. \
This license is available with a FAQ at: https://scripts.sil.org/OFL";

pub const LICENSE_URL: &str = "https://scripts.sil.org/OFL";

/// Shared design grid. BIZ UDPGothic is 1802/246 and Inter is 1638/410.
pub const EM_METRICS: EmMetrics = EmMetrics::new(1782, 266);

/// Win/hhea ascent, with headroom for stacked diacritics.
pub const FONT_ASCENT: u16 = EM_METRICS.ascent + 170;

/// Win/hhea descent magnitude.
pub const FONT_DESCENT: u16 = EM_METRICS.descent + 160;

/// Slant applied to the Japanese glyphs of the italic styles, in degrees.
pub const ITALIC_ANGLE: f64 = 9.4;

/// Prefix of the scratch files written by the merge step.
pub const TEMP_PREFIX: &str = "tmp_";

/// Attempts made to find an unused scratch filename.
pub const TEMP_RETRIES: usize = 10;

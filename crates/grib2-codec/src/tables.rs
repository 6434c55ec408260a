//! AIFS parameter lookup tables.
//!
//! Maps between the AIFS variable short codes used throughout the
//! perturbation pipeline and GRIB2 (discipline, category, number, level
//! type) tuples. Several surface variables share parameter codes with
//! their upper-air counterparts (`2t`/`t`, `10u`/`u`, `10v`/`v`) and are
//! disambiguated by level type.

/// GRIB2 codes identifying one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableCodes {
    pub discipline: u8,
    pub category: u8,
    pub number: u8,
    pub level_type: u8,
    pub level_value: u32,
}

/// Look up the GRIB2 codes for an AIFS variable at a given level.
///
/// `level` is the vertical level in hPa for upper-air variables and `0`
/// for surface variables. Returns `None` for unknown variables or for an
/// upper-air-only variable requested at the surface.
pub fn codes_for(variable: &str, level: u32) -> Option<VariableCodes> {
    let (discipline, category, number, level_type, level_value) = match (variable, level) {
        // Upper-air variables on isobaric surfaces (level value in Pa)
        ("q", l) if l > 0 => (0, 1, 0, 100, l * 100),
        ("t", l) if l > 0 => (0, 0, 0, 100, l * 100),
        ("w", l) if l > 0 => (0, 2, 8, 100, l * 100),
        ("z", l) if l > 0 => (0, 3, 4, 100, l * 100),
        ("u", l) if l > 0 => (0, 2, 2, 100, l * 100),
        ("v", l) if l > 0 => (0, 2, 3, 100, l * 100),

        // Surface variables
        ("10u", 0) => (0, 2, 2, 103, 10),
        ("10v", 0) => (0, 2, 3, 103, 10),
        ("2d", 0) => (0, 0, 6, 103, 2),
        ("2t", 0) => (0, 0, 0, 103, 2),
        ("lsm", 0) => (2, 0, 0, 1, 0),
        ("msl", 0) => (0, 3, 1, 101, 0),
        ("sdor", 0) => (0, 3, 20, 1, 0),
        ("skt", 0) => (0, 0, 17, 1, 0),
        ("slor", 0) => (0, 3, 22, 1, 0),
        ("sp", 0) => (0, 3, 0, 1, 0),
        ("tcw", 0) => (0, 1, 51, 1, 0),
        ("z", 0) => (0, 3, 4, 1, 0),

        _ => return None,
    };

    Some(VariableCodes {
        discipline,
        category,
        number,
        level_type,
        level_value,
    })
}

/// Resolve the AIFS short code for a GRIB2 parameter.
///
/// Level type 100 (isobaric surface) selects the upper-air reading of a
/// shared parameter code; any other level type selects the surface one.
/// Unknown parameters fall back to a `P{discipline}_{category}_{number}`
/// placeholder name.
pub fn short_name(discipline: u8, category: u8, number: u8, level_type: u8) -> String {
    let isobaric = level_type == 100;

    let name = match (discipline, category, number) {
        (0, 0, 0) => {
            if isobaric {
                "t"
            } else {
                "2t"
            }
        }
        (0, 0, 6) => "2d",
        (0, 0, 17) => "skt",
        (0, 1, 0) => "q",
        (0, 1, 51) => "tcw",
        (0, 2, 2) => {
            if isobaric {
                "u"
            } else {
                "10u"
            }
        }
        (0, 2, 3) => {
            if isobaric {
                "v"
            } else {
                "10v"
            }
        }
        (0, 2, 8) => "w",
        (0, 3, 0) => "sp",
        (0, 3, 1) => "msl",
        (0, 3, 4) => "z",
        (0, 3, 20) => "sdor",
        (0, 3, 22) => "slor",
        (2, 0, 0) => "lsm",
        _ => return format!("P{}_{}_{}", discipline, category, number),
    };

    name.to_string()
}

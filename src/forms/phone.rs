//! Mobile number plausibility.
//!
//! A number is plausible when it matches the mobile numbering plan of at
//! least one supported country, with or without its international prefix.
//! This is a format check only; nothing here says the number is reachable.

use std::sync::LazyLock;

use regex::Regex;

/// (region, mobile pattern). Patterns are anchored and expect the number
/// exactly as typed, after trimming.
const MOBILE_PATTERNS: &[(&str, &str)] = &[
    // US, Canada and the rest of NANP
    ("NANP", r"^((\+1|1)?( |-)?)?(\([2-9][0-9]{2}\)|[2-9][0-9]{2})( |-)?([2-9][0-9]{2}( |-)?[0-9]{4})$"),
    ("GB", r"^(\+?44|0)7\d{9}$"),
    ("IE", r"^(\+?353|0)8[356789]\d{7}$"),
    ("AU", r"^(\+?61|0)4\d{8}$"),
    ("NZ", r"^(\+?64|0)[28]\d{7,9}$"),
    ("IN", r"^(\+?91|0)?[6789]\d{9}$"),
    ("DE", r"^((\+49|0)1)(5[0-25-9]\d|6([23]|0\d?)|7([0-57-9]|6\d))\d{7,9}$"),
    ("FR", r"^(\+?33|0)[67]\d{8}$"),
    ("ES", r"^(\+?34)?[67]\d{8}$"),
    ("IT", r"^(\+?39)?\s?3\d{2} ?\d{6,7}$"),
    ("NL", r"^(((?:\+|00)?31\(0\))|((?:\+|00)?31)|0)6\d{8}$"),
    ("BE", r"^(\+?32|0)4\d{8}$"),
    ("PL", r"^(\+?48)? ?([5-8]\d|45) ?\d{3} ?\d{2} ?\d{2}$"),
    ("BR", r"^((\+?55 ?[1-9]{2} ?)|(\+?55 ?\([1-9]{2}\) ?)|(0[1-9]{2} ?)|(\([1-9]{2}\) ?)|([1-9]{2} ?))((\d{4}-?\d{4})|(9[1-9]\d{3}-?\d{4}))$"),
    ("MX", r"^(\+?52)?(1|01)?\d{10,11}$"),
    ("ZA", r"^(\+?27|0)\d{9}$"),
    ("NG", r"^(\+?234|0)?[789]\d{9}$"),
    ("KE", r"^(\+?254|0)(7|1)\d{8}$"),
    ("SG", r"^(\+65)?[3689]\d{7}$"),
    ("PH", r"^(09|\+639)\d{9}$"),
    ("JP", r"^(\+81[ -]?(\(0\))?|0)[6789]0[ -]?\d{4}[ -]?\d{4}$"),
    ("CN", r"^((\+|00)86)?(1[3-9]|9[28])\d{9}$"),
    ("AE", r"^((\+?971)|0)?5[024568]\d{7}$"),
    ("PK", r"^((00|\+)?92|0)3[0-6]\d{8}$"),
];

static COMPILED: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    MOBILE_PATTERNS
        .iter()
        .filter_map(|(region, pattern)| match Regex::new(pattern) {
            Ok(re) => Some((*region, re)),
            Err(e) => {
                tracing::error!(region = %region, error = %e, "Invalid mobile pattern");
                None
            }
        })
        .collect()
});

/// Region whose mobile plan the number fits, if any.
pub fn matching_region(number: &str) -> Option<&'static str> {
    COMPILED
        .iter()
        .find(|(_, re)| re.is_match(number))
        .map(|(region, _)| *region)
}

/// True when the number fits any supported mobile plan.
pub fn is_plausible_mobile(number: &str) -> bool {
    matching_region(number).is_some()
}

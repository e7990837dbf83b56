//! Static postcode-area to distribution network operator table.

use std::collections::HashMap;
use std::sync::LazyLock;

pub const UNKNOWN_OPERATOR: (&str, &str) = ("Unknown", "Unknown");

/// `(postcode area, dno id, dno name)`
const AREAS: &[(&str, &str, &str)] = &[
    // London Power Networks
    ("EC", "UKPN_LPN", "UKPN_1"),
    ("WC", "UKPN_LPN", "UKPN_1"),
    ("E", "UKPN_LPN", "UKPN_1"),
    ("N", "UKPN_LPN", "UKPN_1"),
    ("NW", "UKPN_LPN", "UKPN_1"),
    ("SE", "UKPN_LPN", "UKPN_1"),
    ("SW", "UKPN_LPN", "UKPN_1"),
    ("W", "UKPN_LPN", "UKPN_1"),
    // Eastern Power Networks
    ("AL", "UKPN_EPN", "UKPN_2"),
    ("CB", "UKPN_EPN", "UKPN_2"),
    ("CM", "UKPN_EPN", "UKPN_2"),
    ("CO", "UKPN_EPN", "UKPN_2"),
    ("EN", "UKPN_EPN", "UKPN_2"),
    ("IG", "UKPN_EPN", "UKPN_2"),
    ("IP", "UKPN_EPN", "UKPN_2"),
    ("LU", "UKPN_EPN", "UKPN_2"),
    ("NR", "UKPN_EPN", "UKPN_2"),
    ("PE", "UKPN_EPN", "UKPN_2"),
    ("RM", "UKPN_EPN", "UKPN_2"),
    ("SG", "UKPN_EPN", "UKPN_2"),
    ("SS", "UKPN_EPN", "UKPN_2"),
    ("WD", "UKPN_EPN", "UKPN_2"),
    // South Eastern Power Networks
    ("BN", "UKPN_SPN", "UKPN_3"),
    ("BR", "UKPN_SPN", "UKPN_3"),
    ("CR", "UKPN_SPN", "UKPN_3"),
    ("CT", "UKPN_SPN", "UKPN_3"),
    ("DA", "UKPN_SPN", "UKPN_3"),
    ("KT", "UKPN_SPN", "UKPN_3"),
    ("ME", "UKPN_SPN", "UKPN_3"),
    ("RH", "UKPN_SPN", "UKPN_3"),
    ("SM", "UKPN_SPN", "UKPN_3"),
    ("TN", "UKPN_SPN", "UKPN_3"),
    ("TW", "UKPN_SPN", "UKPN_3"),
    // Southern Electric Power Distribution
    ("BH", "SSEN_SEPD", "SSEN_1"),
    ("GU", "SSEN_SEPD", "SSEN_1"),
    ("HP", "SSEN_SEPD", "SSEN_1"),
    ("OX", "SSEN_SEPD", "SSEN_1"),
    ("PO", "SSEN_SEPD", "SSEN_1"),
    ("RG", "SSEN_SEPD", "SSEN_1"),
    ("SL", "SSEN_SEPD", "SSEN_1"),
    ("SN", "SSEN_SEPD", "SSEN_1"),
    ("SO", "SSEN_SEPD", "SSEN_1"),
    ("SP", "SSEN_SEPD", "SSEN_1"),
    ("UB", "SSEN_SEPD", "SSEN_1"),
    // Scottish Hydro Electric Power Distribution
    ("AB", "SSEN_SHEPD", "SSEN_2"),
    ("DD", "SSEN_SHEPD", "SSEN_2"),
    ("HS", "SSEN_SHEPD", "SSEN_2"),
    ("IV", "SSEN_SHEPD", "SSEN_2"),
    ("KW", "SSEN_SHEPD", "SSEN_2"),
    ("PH", "SSEN_SHEPD", "SSEN_2"),
    ("ZE", "SSEN_SHEPD", "SSEN_2"),
    // SP Distribution
    ("DG", "SPEN_SPD", "SPEN_1"),
    ("EH", "SPEN_SPD", "SPEN_1"),
    ("FK", "SPEN_SPD", "SPEN_1"),
    ("G", "SPEN_SPD", "SPEN_1"),
    ("KA", "SPEN_SPD", "SPEN_1"),
    ("KY", "SPEN_SPD", "SPEN_1"),
    ("ML", "SPEN_SPD", "SPEN_1"),
    ("PA", "SPEN_SPD", "SPEN_1"),
    ("TD", "SPEN_SPD", "SPEN_1"),
    // SP Manweb
    ("CH", "SPEN_SPM", "SPEN_2"),
    ("CW", "SPEN_SPM", "SPEN_2"),
    ("L", "SPEN_SPM", "SPEN_2"),
    ("LL", "SPEN_SPM", "SPEN_2"),
    ("SY", "SPEN_SPM", "SPEN_2"),
    // National Grid West Midlands
    ("B", "NGED_WMID", "NGED_1"),
    ("CV", "NGED_WMID", "NGED_1"),
    ("DY", "NGED_WMID", "NGED_1"),
    ("HR", "NGED_WMID", "NGED_1"),
    ("ST", "NGED_WMID", "NGED_1"),
    ("TF", "NGED_WMID", "NGED_1"),
    ("WR", "NGED_WMID", "NGED_1"),
    ("WS", "NGED_WMID", "NGED_1"),
    ("WV", "NGED_WMID", "NGED_1"),
    // National Grid East Midlands
    ("DE", "NGED_EMID", "NGED_2"),
    ("LE", "NGED_EMID", "NGED_2"),
    ("LN", "NGED_EMID", "NGED_2"),
    ("MK", "NGED_EMID", "NGED_2"),
    ("NG", "NGED_EMID", "NGED_2"),
    ("NN", "NGED_EMID", "NGED_2"),
    // National Grid South Wales
    ("CF", "NGED_SWALES", "NGED_3"),
    ("LD", "NGED_SWALES", "NGED_3"),
    ("NP", "NGED_SWALES", "NGED_3"),
    ("SA", "NGED_SWALES", "NGED_3"),
    // National Grid South West
    ("BA", "NGED_SWEST", "NGED_4"),
    ("BS", "NGED_SWEST", "NGED_4"),
    ("DT", "NGED_SWEST", "NGED_4"),
    ("EX", "NGED_SWEST", "NGED_4"),
    ("GL", "NGED_SWEST", "NGED_4"),
    ("PL", "NGED_SWEST", "NGED_4"),
    ("TA", "NGED_SWEST", "NGED_4"),
    ("TQ", "NGED_SWEST", "NGED_4"),
    ("TR", "NGED_SWEST", "NGED_4"),
    // Electricity North West
    ("BB", "ENWL", "ENWL_1"),
    ("BL", "ENWL", "ENWL_1"),
    ("CA", "ENWL", "ENWL_1"),
    ("FY", "ENWL", "ENWL_1"),
    ("LA", "ENWL", "ENWL_1"),
    ("M", "ENWL", "ENWL_1"),
    ("OL", "ENWL", "ENWL_1"),
    ("PR", "ENWL", "ENWL_1"),
    ("SK", "ENWL", "ENWL_1"),
    ("WA", "ENWL", "ENWL_1"),
    ("WN", "ENWL", "ENWL_1"),
    // Northern Powergrid
    ("DH", "NPG_NE", "NPG_1"),
    ("DL", "NPG_NE", "NPG_1"),
    ("NE", "NPG_NE", "NPG_1"),
    ("SR", "NPG_NE", "NPG_1"),
    ("TS", "NPG_NE", "NPG_1"),
    ("BD", "NPG_Y", "NPG_2"),
    ("DN", "NPG_Y", "NPG_2"),
    ("HD", "NPG_Y", "NPG_2"),
    ("HG", "NPG_Y", "NPG_2"),
    ("HU", "NPG_Y", "NPG_2"),
    ("HX", "NPG_Y", "NPG_2"),
    ("LS", "NPG_Y", "NPG_2"),
    ("S", "NPG_Y", "NPG_2"),
    ("WF", "NPG_Y", "NPG_2"),
    ("YO", "NPG_Y", "NPG_2"),
];

static OPERATORS: LazyLock<HashMap<&'static str, (&'static str, &'static str)>> =
    LazyLock::new(|| {
        AREAS
            .iter()
            .map(|(area, id, name)| (*area, (*id, *name)))
            .collect()
    });

/// Network operator for a normalised postcode or outward code.
///
/// Tries the two-character prefix, then the one-character prefix, else
/// `("Unknown", "Unknown")`. The one-character prefix is only consulted for
/// single-letter areas (second character a digit), so `BT` or `GY` never fall
/// through to `B` or `G`.
#[must_use]
pub fn operator_for(code: &str) -> (&'static str, &'static str) {
    let upper = code.trim().to_ascii_uppercase();
    let mut chars = upper.chars();
    let (Some(first), second) = (chars.next(), chars.next()) else {
        return UNKNOWN_OPERATOR;
    };

    if let Some(second) = second {
        let two: String = [first, second].iter().collect();
        if let Some(found) = OPERATORS.get(two.as_str()) {
            return *found;
        }
        if second.is_ascii_alphabetic() {
            return UNKNOWN_OPERATOR;
        }
    }

    let one = first.to_string();
    OPERATORS.get(one.as_str()).copied().unwrap_or(UNKNOWN_OPERATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_letter_prefix_wins() {
        assert_eq!(operator_for("EC1A1BB"), ("UKPN_LPN", "UKPN_1"));
        assert_eq!(operator_for("NE1 4ST"), ("NPG_NE", "NPG_1"));
        assert_eq!(operator_for("SA1"), ("NGED_SWALES", "NGED_3"));
    }

    #[test]
    fn single_letter_areas_fall_back() {
        assert_eq!(operator_for("E14 5AB"), ("UKPN_LPN", "UKPN_1"));
        assert_eq!(operator_for("M1 1AE"), ("ENWL", "ENWL_1"));
        assert_eq!(operator_for("s10"), ("NPG_Y", "NPG_2"));
    }

    #[test]
    fn unmapped_areas_are_unknown() {
        assert_eq!(operator_for("ZZ1 1ZZ"), UNKNOWN_OPERATOR);
        assert_eq!(operator_for("BT1 1AA"), UNKNOWN_OPERATOR);
        assert_eq!(operator_for(""), UNKNOWN_OPERATOR);
    }
}

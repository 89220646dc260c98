//! Distance labels embedded in calibration file names.

const PREFIX: &str = "distance_";
const SUFFIX: &str = "cm.csv";

/// Extract the labelled distance in meters from a file name.
///
/// Matches `Distance_<digits>[.<digits>]cm.csv` anywhere in the name,
/// ignoring case. The label is in centimeters.
pub fn distance_label(file_name: &str) -> Option<f64> {
    let lower = file_name.to_ascii_lowercase();

    let mut search_from = 0;
    while let Some(pos) = lower[search_from..].find(PREFIX) {
        let start = search_from + pos + PREFIX.len();
        if let Some(cm) = parse_label(&lower[start..]) {
            return Some(cm / 100.0);
        }
        search_from = start;
    }

    None
}

/// Parse `<digits>[.<digits>]cm.csv` at the start of `s`, returning centimeters.
fn parse_label(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();

    let int_len = digit_run(bytes);
    if int_len == 0 {
        return None;
    }
    let mut len = int_len;

    // Fractional part only counts when digits follow the dot
    if bytes.get(len) == Some(&b'.') {
        let frac_len = digit_run(&bytes[len + 1..]);
        if frac_len > 0 {
            len += 1 + frac_len;
        }
    }

    if !s[len..].starts_with(SUFFIX) {
        return None;
    }

    s[..len].parse().ok()
}

fn digit_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

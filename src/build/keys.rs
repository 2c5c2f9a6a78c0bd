use std::collections::HashMap;
use std::hash::Hash;

/// Hands out integer ids to natural keys, first come first served.
///
/// Ids start at 1 and are dense in order of first appearance.
#[derive(Debug, Clone)]
pub struct SurrogateKeys<K> {
    next: i64,
    ids: HashMap<K, i64>,
}

impl<K: Eq + Hash> SurrogateKeys<K> {
    pub fn new() -> Self {
        Self {
            next: 1,
            ids: HashMap::new(),
        }
    }

    /// Id for `key`, and whether it was assigned by this call
    pub fn assign(&mut self, key: K) -> (i64, bool) {
        if let Some(&id) = self.ids.get(&key) {
            return (id, false);
        }
        let id = self.next;
        self.next += 1;
        self.ids.insert(key, id);
        (id, true)
    }

    pub fn into_lookup(self) -> HashMap<K, i64> {
        self.ids
    }
}

impl<K: Eq + Hash> Default for SurrogateKeys<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Trimmed value, `None` if nothing is left
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// First letter upper case, the rest lower case ("summer" -> "Summer")
pub fn capitalize(value: &str) -> String {
    let mut chars = value.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Lenient numeric coercion: anything unparseable or non-finite is `None`
pub fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Integer ids, accepting integral floats such as "12.0". Values outside
/// the `i64` range are rejected.
pub fn parse_id(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(v))
            .map(|v| v as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_and_stable() {
        let mut keys = SurrogateKeys::new();
        assert_eq!(keys.assign("Judo".to_string()), (1, true));
        assert_eq!(keys.assign("Rowing".to_string()), (2, true));
        assert_eq!(keys.assign("Judo".to_string()), (1, false));
        let lookup = keys.into_lookup();
        assert_eq!(lookup.get("Rowing"), Some(&2));
        assert_eq!(lookup.get("Luge"), None);
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("summer"), "Summer");
        assert_eq!(capitalize("WINTER"), "Winter");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(Some("24")), Some(24.0));
        assert_eq!(parse_number(Some(" 180.5 ")), Some(180.5));
        assert_eq!(parse_number(Some("N/A")), None);
        assert_eq!(parse_number(Some("inf")), None);
        assert_eq!(parse_number(None), None);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(Some("42")), Some(42));
        assert_eq!(parse_id(Some("42.0")), Some(42));
        assert_eq!(parse_id(Some("42.5")), None);
        assert_eq!(parse_id(Some("x")), None);
    }

    #[test]
    fn test_parse_id_rejects_out_of_range_floats() {
        assert_eq!(parse_id(Some("1e300")), None);
        assert_eq!(parse_id(Some("-1e300")), None);
        assert_eq!(parse_id(Some("9.3e18")), None);
        assert_eq!(parse_id(Some("1e18")), Some(1_000_000_000_000_000_000));
    }
}

//! URL-encoded form parsing.
//!
//! Minimal, no-dependency decoding of `application/x-www-form-urlencoded`
//! bodies, for HTTP servers that hand over the raw request body (the ESP-IDF
//! server). The axum surface uses its own `Form` extractor instead.
//!
//! ```
//! use sunstrip::parsing::FormFields;
//!
//! let form = FormFields::parse("mode=solid&color=%236bffdf");
//! assert_eq!(form.get("mode"), Some("solid"));
//! assert_eq!(form.get("color"), Some("#6bffdf"));
//! assert_eq!(form.get("missing"), None);
//! ```

/// Decoded form fields in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    fields: Vec<(String, String)>,
}

impl FormFields {
    /// Parse a URL-encoded body. Pairs without `=` get an empty value.
    pub fn parse(body: &str) -> Self {
        let fields = body
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (url_decode(k), url_decode(v)),
                None => (url_decode(pair), String::new()),
            })
            .collect();
        Self { fields }
    }

    /// First value submitted for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields were submitted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Decode `+` and `%XX` escapes. Invalid escapes are kept literally and
/// invalid UTF-8 is replaced.
pub fn url_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => match hex_pair(bytes[i + 1], bytes[i + 2]) {
                Some(b) => {
                    out.push(b);
                    i += 3;
                }
                None => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_plus_and_percent() {
        assert_eq!(url_decode("a+b%20c"), "a b c");
        assert_eq!(url_decode("%23ff0000"), "#ff0000");
        assert_eq!(url_decode("esp%2Fsensors"), "esp/sensors");
    }

    #[test]
    fn decode_invalid_escape_kept() {
        assert_eq!(url_decode("100%"), "100%");
        assert_eq!(url_decode("%zz"), "%zz");
        assert_eq!(url_decode("%4"), "%4");
    }

    #[test]
    fn decode_utf8() {
        assert_eq!(url_decode("%E2%98%80"), "☀");
    }

    #[test]
    fn parse_pairs() {
        let form = FormFields::parse("ssid=My+Net&wifipw=&sun_en0=on&flag");
        assert_eq!(form.len(), 4);
        assert_eq!(form.get("ssid"), Some("My Net"));
        assert_eq!(form.get("wifipw"), Some(""));
        assert_eq!(form.get("sun_en0"), Some("on"));
        assert_eq!(form.get("flag"), Some(""));
    }

    #[test]
    fn parse_first_value_wins() {
        let form = FormFields::parse("a=1&a=2");
        assert_eq!(form.get("a"), Some("1"));
    }

    #[test]
    fn parse_empty_body() {
        assert!(FormFields::parse("").is_empty());
    }
}

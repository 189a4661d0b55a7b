use crate::Result;

pub struct Utils;
impl Utils {
    /// Parse a hex byte string such as `"AF 23 D5 45"`, `"af23d545"` or `"0xAF23"`.
    pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
            .collect();
        Ok(hex::decode(compact)?)
    }

    /// Space separated lowercase hex, the layout used in sync error diagnostics.
    pub fn hex_dump(data: &[u8]) -> String {
        data.iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Zero-pad or truncate `data` to `required` bytes.
    ///
    /// `what` names the field in the warning emitted when the length is adjusted.
    pub fn fit_length(data: &[u8], required: usize, what: &str) -> Vec<u8> {
        if data.len() < required {
            tracing::warn!("Padding {}...", what);
            let mut padded = data.to_vec();
            padded.resize(required, 0);
            padded
        } else if data.len() > required {
            tracing::warn!("Truncating {}...", what);
            data[..required].to_vec()
        } else {
            data.to_vec()
        }
    }
}

use secrecy::{ExposeSecret, SecretString};

pub const REDACTED: &str = "[REDACTED]";

/// Format a secret value, respecting the show_secrets flag.
pub fn format_secret(secret: &SecretString, show_secrets: bool) -> String {
    if show_secrets {
        secret.expose_secret().to_string()
    } else {
        REDACTED.to_string()
    }
}

/// Rewrite an ODBC connection string so the `PWD` attribute value is hidden.
///
/// Braced values (`PWD={a;b}`) are treated as a single value, with `}}` as an
/// escaped closing brace, so a password containing `;` is masked in full.
pub fn masked_connection_string(conn_str: &str, show_secrets: bool) -> String {
    if show_secrets {
        return conn_str.to_string();
    }

    let mut out = String::with_capacity(conn_str.len());
    let mut rest = conn_str;
    while !rest.is_empty() {
        let (key, after_key) = match rest.find('=') {
            Some(pos) => (&rest[..pos], &rest[pos + 1..]),
            None => {
                out.push_str(rest);
                break;
            }
        };
        let value_len = attribute_value_len(after_key);
        let value = &after_key[..value_len];
        out.push_str(key);
        out.push('=');
        if key.trim().eq_ignore_ascii_case("pwd") {
            out.push_str(REDACTED);
        } else {
            out.push_str(value);
        }
        rest = &after_key[value_len..];
        if let Some(stripped) = rest.strip_prefix(';') {
            out.push(';');
            rest = stripped;
        }
    }
    out
}

/// Length of the attribute value at the start of `s`, up to (not including) the terminating `;`.
fn attribute_value_len(s: &str) -> usize {
    if !s.starts_with('{') {
        return s.find(';').unwrap_or(s.len());
    }
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'}' {
            if bytes.get(i + 1) == Some(&b'}') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    s.len()
}

use prodreport::masking::{format_secret, masked_connection_string, REDACTED};
use secrecy::SecretString;

#[test]
fn test_secret_masked_by_default() {
    let secret = SecretString::from("my-super-secret-password".to_string());
    let output = format_secret(&secret, false);
    assert_eq!(output, REDACTED);
    assert!(!output.contains("my-super-secret-password"));
}

#[test]
fn test_secret_exposed_with_show_secrets() {
    let secret = SecretString::from("my-super-secret-password".to_string());
    assert_eq!(format_secret(&secret, true), "my-super-secret-password");
}

#[test]
fn test_secret_debug_is_redacted() {
    let secret = SecretString::from("password123".to_string());
    let debug_output = format!("{:?}", secret);
    assert!(!debug_output.contains("password123"), "Debug should not expose secret: {}", debug_output);
}

#[test]
fn test_connection_string_password_masked() {
    let conn = "Driver={ODBC Driver 18 for SQL Server};Server=localhost,1433;UID=sa;PWD=hunter2;TrustServerCertificate=no;";
    let masked = masked_connection_string(conn, false);
    assert_eq!(
        masked,
        "Driver={ODBC Driver 18 for SQL Server};Server=localhost,1433;UID=sa;PWD=[REDACTED];TrustServerCertificate=no;"
    );
}

#[test]
fn test_braced_password_with_separators_masked_in_full() {
    let conn = "Server=db,1433;UID=sa;PWD={p;w}}d=x};Database=OrdersDB;";
    let masked = masked_connection_string(conn, false);
    assert_eq!(masked, "Server=db,1433;UID=sa;PWD=[REDACTED];Database=OrdersDB;");
    assert!(!masked.contains("p;w"));
    assert!(!masked.contains("d=x"));
}

#[test]
fn test_lowercase_pwd_key_masked() {
    let masked = masked_connection_string("uid=sa;pwd=secret", false);
    assert_eq!(masked, "uid=sa;pwd=[REDACTED]");
}

#[test]
fn test_show_secrets_leaves_connection_string_alone() {
    let conn = "UID=sa;PWD=hunter2;";
    assert_eq!(masked_connection_string(conn, true), conn);
}

#[test]
fn test_string_without_password_unchanged() {
    let conn = "Driver={ODBC Driver 17 for SQL Server};Server=db,1433;Database=Orders;";
    assert_eq!(masked_connection_string(conn, false), conn);
}

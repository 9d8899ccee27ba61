//! Small SQL helpers shared by the seeder and inspector.

use crate::error::{SchemaError, SchemaResult};

/// Double-quote an identifier for Postgres.
///
/// The USDE schema carries Prisma-style PascalCase/camelCase names
/// (`"Company"`, `"kycStatus"`), which are only addressable when quoted.
/// Embedded quotes are rejected rather than escaped; no legitimate
/// identifier in this schema contains one.
pub fn quote_ident(ident: &str) -> SchemaResult<String> {
    if ident.is_empty() {
        return Err(SchemaError::Seed("empty identifier".to_string()));
    }
    if ident.contains('"') {
        return Err(SchemaError::Seed(format!(
            "identifier '{}' contains a quote character",
            ident
        )));
    }
    Ok(format!("\"{}\"", ident))
}

/// Quote and comma-join a list of identifiers.
pub fn quote_ident_list(idents: &[String]) -> SchemaResult<String> {
    let quoted: SchemaResult<Vec<String>> = idents.iter().map(|i| quote_ident(i)).collect();
    Ok(quoted?.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_camel_case_identifiers() {
        assert_eq!(quote_ident("kycStatus").unwrap(), "\"kycStatus\"");
        assert_eq!(quote_ident("Company").unwrap(), "\"Company\"");
    }

    #[test]
    fn rejects_embedded_quotes() {
        assert!(quote_ident("bad\"name").is_err());
        assert!(quote_ident("").is_err());
    }

    #[test]
    fn joins_identifier_lists() {
        let cols = vec!["id".to_string(), "email".to_string()];
        assert_eq!(quote_ident_list(&cols).unwrap(), "\"id\", \"email\"");
    }
}

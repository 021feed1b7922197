//! Command-line argument construction for the mongo tools.

use super::{MongoError, MongoResult};
use crate::config::{DatabaseConfig, DumpConfig};

/// Which binary the arguments are for. `mongorestore` deprecated `--db` in
/// favor of `--nsInclude`, so database scoping differs between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Dump,
    Restore,
}

/// Build the connection arguments shared by dump and restore.
pub fn connection_args(db: &DatabaseConfig, kind: ToolKind) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(uri) = &db.uri {
        args.push("--uri".to_string());
        args.push(uri.clone());
    } else {
        args.push("--host".to_string());
        args.push(db.host.clone());
        args.push("--port".to_string());
        args.push(db.port.to_string());

        if let (Some(username), Some(password)) = (&db.username, &db.password) {
            args.push("--username".to_string());
            args.push(username.clone());
            args.push("--password".to_string());
            args.push(password.clone());
            args.push("--authenticationDatabase".to_string());
            args.push(db.auth_db.clone());
        }

        if let Some(name) = db.db.as_deref().filter(|name| *name != "*") {
            match kind {
                ToolKind::Dump => {
                    args.push("--db".to_string());
                    args.push(name.to_string());
                }
                ToolKind::Restore => {
                    args.push("--nsInclude".to_string());
                    args.push(name.to_string());
                }
            }
        }
    }

    if db.ssl {
        args.push("--ssl".to_string());
    }
    if let Some(ca_file) = &db.ssl_ca_file {
        args.push("--sslCAFile".to_string());
        args.push(ca_file.clone());
    }
    if let Some(pem_key_file) = &db.ssl_pem_key_file {
        args.push("--sslPEMKeyFile".to_string());
        args.push(pem_key_file.clone());
    }
    if let Some(pem_key_password) = &db.ssl_pem_key_password {
        args.push("--sslPEMKeyPassword".to_string());
        args.push(pem_key_password.clone());
    }
    if let Some(crl_file) = &db.ssl_crl_file {
        args.push("--sslCRLFile".to_string());
        args.push(crl_file.clone());
    }
    if db.tls_insecure {
        args.push("--tlsInsecure".to_string());
    }

    args
}

/// Collection scoping arguments for `mongodump`.
///
/// The `collection` / `exclude_collections` mutual exclusion is enforced at
/// config load time; this only formats.
pub fn collection_args(dump: &DumpConfig) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(collection) = &dump.collection {
        args.push("--collection".to_string());
        args.push(collection.clone());
    }
    if let Some(excluded) = &dump.exclude_collections {
        for collection in excluded {
            args.push("--excludeCollection".to_string());
            args.push(collection.clone());
        }
    }
    args
}

/// Resolve the database name used for archive naming.
///
/// With a URI configured, the name is the path segment between the last `/`
/// and the query string. A wildcard or absent name resolves to "all"
/// (a full-instance dump).
pub fn database_name(db: &DatabaseConfig) -> MongoResult<String> {
    if let Some(uri) = &db.uri {
        if !uri.contains('/') {
            return Err(MongoError::InvalidOptions(
                "uri: database name for dump is required".to_string(),
            ));
        }
        let after_slash = &uri[uri.rfind('/').unwrap_or(0) + 1..];
        let name = after_slash
            .split('?')
            .next()
            .unwrap_or(after_slash)
            .to_string();
        if name.is_empty() || name == "*" {
            return Ok("all".to_string());
        }
        return Ok(name);
    }

    match db.db.as_deref() {
        Some("") | Some("*") | None => Ok("all".to_string()),
        Some(name) => Ok(name.to_string()),
    }
}

//! Handler for the `sign` command.

use std::collections::BTreeMap;

use super::SignArgs;
use crate::config::SECRET_KEY_ENV;
use crate::domain::{SignatureVersion, Signer, SigningInput};
use crate::error::Result;

/// Compute the signature described by `args`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`](crate::error::ConfigError::MissingField)
/// when no secret is given on the command line or in the environment.
pub fn execute(args: &SignArgs) -> Result<String> {
    let secret = args
        .secret_key
        .clone()
        .or_else(|| std::env::var(SECRET_KEY_ENV).ok())
        .unwrap_or_default();

    let version = if args.v2 {
        SignatureVersion::V2
    } else {
        SignatureVersion::V1
    };
    let signer = Signer::new(&secret)?.with_version(version);

    let params: BTreeMap<String, String> = args.params.iter().cloned().collect();
    signer.sign(&SigningInput {
        subscribe_key: &args.subscribe_key,
        publish_key: &args.publish_key,
        method: args.method,
        path: &args.path,
        params: &params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{sign, Method};
    use crate::error::{ConfigError, Error};

    fn args(secret: Option<&str>) -> SignArgs {
        SignArgs {
            secret_key: secret.map(str::to_string),
            subscribe_key: "sub".into(),
            publish_key: "pub".into(),
            path: "/v1/auth/grant/sub-key/sub".into(),
            method: Method::Get,
            params: vec![("timestamp".into(), "1356998400".into())],
            v2: false,
        }
    }

    #[test]
    fn matches_library_signature() {
        let mut params = BTreeMap::new();
        params.insert("timestamp".to_string(), "1356998400".to_string());
        let expected = sign(
            "secret",
            &SigningInput {
                subscribe_key: "sub",
                publish_key: "pub",
                method: Method::Get,
                path: "/v1/auth/grant/sub-key/sub",
                params: &params,
            },
        )
        .unwrap();

        assert_eq!(execute(&args(Some("secret"))).unwrap(), expected);
    }

    #[test]
    fn v2_flag_changes_layout() {
        let mut v2 = args(Some("secret"));
        v2.v2 = true;
        assert!(execute(&v2).unwrap().starts_with("v2."));
    }

    #[test]
    fn blank_secret_is_rejected() {
        assert!(matches!(
            execute(&args(Some("  "))),
            Err(Error::Config(ConfigError::MissingField { field: "secret_key" }))
        ));
    }
}

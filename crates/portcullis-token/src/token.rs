//! Token signing and verification.

use crate::claims::{
    ApiTokenPrincipal, Claims, ClaimsKind, DevicePrincipal, Principal, UserPrincipal,
};
use crate::error::TokenError;
use crate::keys::KeyPair;
use biscuit_auth::builder::{AuthorizerBuilder, BiscuitBuilder};
use biscuit_auth::error::{Format, Token as BiscuitTokenError};
use biscuit_auth::macros::{check, fact};
use biscuit_auth::{Authorizer, Biscuit, PublicKey};
use chrono::{DateTime, Utc};
use portcullis_core::Fingerprint;

/// Every fact name a token may carry, with the kinds that carry it.
const FACTS: &[(&str, &[ClaimsKind])] = &[
    ("fingerprint", &[ClaimsKind::Device]),
    ("user_id", &[ClaimsKind::User]),
    ("username", &[ClaimsKind::User]),
    ("tenant", &[ClaimsKind::User]),
    ("admin", &[ClaimsKind::User]),
    ("expires_at", &[ClaimsKind::User]),
    ("token_id", &[ClaimsKind::Token]),
    ("tenant_id", &[ClaimsKind::Token]),
    ("read_only", &[ClaimsKind::Token]),
    ("generation", &[ClaimsKind::Token]),
];

/// Signs claims with the process keypair.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    keypair: KeyPair,
}

impl TokenSigner {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    /// A verifier paired with this signer's key.
    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier::new(self.keypair.public_key())
    }

    pub fn public_key_hex(&self) -> String {
        self.keypair.public_key_hex()
    }

    /// Encode and sign claims into an opaque bearer string.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let signing = |e: BiscuitTokenError| TokenError::Signing(e.to_string());

        let mut builder = Biscuit::builder()
            .fact(fact!("kind({kind})", kind = claims.kind().as_str().to_string()))
            .map_err(signing)?
            .fact(fact!("issued_at({ts})", ts = Utc::now().timestamp()))
            .map_err(signing)?;

        builder = match claims.principal() {
            Principal::Device(device) => builder
                .fact(fact!(
                    "fingerprint({fp})",
                    fp = device.fingerprint.as_str().to_string()
                ))
                .map_err(signing)?,
            Principal::User(user) => user_facts(builder, user, claims.expires_at())?,
            Principal::Token(token) => builder
                .fact(fact!("token_id({id})", id = token.id.clone()))
                .map_err(signing)?
                .fact(fact!("tenant_id({tenant})", tenant = token.tenant_id.clone()))
                .map_err(signing)?
                .fact(fact!("read_only({ro})", ro = token.read_only))
                .map_err(signing)?
                .fact(fact!("generation({g})", g = token.generation.clone()))
                .map_err(signing)?,
        };

        let biscuit = builder.build(self.keypair.inner()).map_err(signing)?;
        biscuit.to_base64().map_err(signing)
    }
}

fn user_facts(
    builder: BiscuitBuilder,
    user: &UserPrincipal,
    expires_at: Option<DateTime<Utc>>,
) -> Result<BiscuitBuilder, TokenError> {
    let signing = |e: BiscuitTokenError| TokenError::Signing(e.to_string());
    let expires_at = expires_at
        .ok_or_else(|| TokenError::Signing("user claims must carry an expiry".to_string()))?
        .timestamp();

    builder
        .fact(fact!("user_id({id})", id = user.id.clone()))
        .map_err(signing)?
        .fact(fact!("username({name})", name = user.username.clone()))
        .map_err(signing)?
        .fact(fact!("tenant({tenant})", tenant = user.tenant.clone()))
        .map_err(signing)?
        .fact(fact!("admin({admin})", admin = user.admin))
        .map_err(signing)?
        .fact(fact!("expires_at({exp})", exp = expires_at))
        .map_err(signing)?
        .check(check!(
            "check if time($time), $time < {expires_at}",
            expires_at = expires_at
        ))
        .map_err(signing)
}

/// Verifies bearer strings against the paired public key.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    public_key: PublicKey,
}

impl TokenVerifier {
    pub fn new(public_key: PublicKey) -> Self {
        Self { public_key }
    }

    /// Verify a bearer string and recover its claims.
    ///
    /// Fails with [`TokenError::Signature`] for a foreign or tampered
    /// signature, [`TokenError::Expired`] for a user token past its expiry and
    /// [`TokenError::InvalidToken`] for anything that does not decode to
    /// exactly one claims shape.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let token = token.trim();
        let biscuit = Biscuit::from_base64(token, self.public_key.clone()).map_err(classify)?;

        // Decoding tolerates some byte changes the signatures do not cover;
        // only the exact serialization we produced is accepted.
        let canonical = biscuit
            .to_base64()
            .map_err(|e| TokenError::InvalidToken(e.to_string()))?;
        if canonical != token {
            return Err(TokenError::InvalidToken(
                "token is not in canonical encoding".to_string(),
            ));
        }

        if biscuit.block_count() != 1 {
            return Err(TokenError::InvalidToken(format!(
                "expected a single authority block, found {}",
                biscuit.block_count()
            )));
        }

        let now = Utc::now().timestamp();
        let mut authorizer = AuthorizerBuilder::new()
            .code(format!(
                r#"
                time({now});
                allow if true;
                "#
            ))
            .map_err(|e| TokenError::InvalidToken(e.to_string()))?
            .build(&biscuit)
            .map_err(|e| TokenError::InvalidToken(e.to_string()))?;

        let authorized = authorizer.authorize();

        let kind = single_string(&mut authorizer, "kind")?;
        let kind = ClaimsKind::parse(&kind)
            .ok_or_else(|| TokenError::InvalidToken(format!("unknown token kind {kind:?}")))?;
        reject_foreign_facts(&mut authorizer, kind)?;

        let claims = match kind {
            ClaimsKind::Device => {
                let raw = single_string(&mut authorizer, "fingerprint")?;
                let fingerprint = Fingerprint::parse(&raw).ok_or_else(|| {
                    TokenError::InvalidToken("malformed device fingerprint".to_string())
                })?;
                Claims::device(fingerprint)
            }
            ClaimsKind::User => {
                let expires_at = single_int(&mut authorizer, "expires_at")?;
                if expires_at <= now {
                    return Err(TokenError::Expired {
                        expired_at: DateTime::from_timestamp(expires_at, 0)
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| expires_at.to_string()),
                    });
                }
                let expires_at = DateTime::from_timestamp(expires_at, 0).ok_or_else(|| {
                    TokenError::InvalidToken("expiry out of range".to_string())
                })?;
                let principal = UserPrincipal {
                    id: single_string(&mut authorizer, "user_id")?,
                    username: single_string(&mut authorizer, "username")?,
                    tenant: single_string(&mut authorizer, "tenant")?,
                    admin: single_bool(&mut authorizer, "admin")?,
                };
                Claims::user_expiring_at(principal, expires_at)
            }
            ClaimsKind::Token => Claims::api_token(ApiTokenPrincipal {
                id: single_string(&mut authorizer, "token_id")?,
                tenant_id: single_string(&mut authorizer, "tenant_id")?,
                read_only: single_bool(&mut authorizer, "read_only")?,
                generation: single_string(&mut authorizer, "generation")?,
            }),
        };

        authorized.map_err(|e| TokenError::InvalidToken(e.to_string()))?;

        tracing::trace!(kind = %claims.kind(), "Verified token");
        Ok(claims)
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key.clone()
    }
}

/// Split parse failures into signature problems and everything else.
fn classify(err: BiscuitTokenError) -> TokenError {
    match err {
        BiscuitTokenError::Format(Format::Signature(e)) => TokenError::Signature(e.to_string()),
        BiscuitTokenError::Format(Format::SealedSignature) => {
            TokenError::Signature("sealed signature rejected".to_string())
        }
        other => TokenError::InvalidToken(other.to_string()),
    }
}

fn query<T>(authorizer: &mut Authorizer, name: &str) -> Result<Vec<T>, TokenError>
where
    T: TryFrom<biscuit_auth::builder::Fact, Error = BiscuitTokenError>,
{
    let rule: biscuit_auth::builder::Rule = format!("data($x) <- {name}($x)")
        .parse()
        .map_err(|e: BiscuitTokenError| TokenError::InvalidToken(e.to_string()))?;
    authorizer
        .query(rule)
        .map_err(|e| TokenError::InvalidToken(e.to_string()))
}

fn single<T>(values: Vec<(T,)>, name: &str) -> Result<T, TokenError> {
    let mut values = values.into_iter();
    match (values.next(), values.next()) {
        (Some((value,)), None) => Ok(value),
        (None, _) => Err(TokenError::InvalidToken(format!("missing {name} claim"))),
        (Some(_), Some(_)) => Err(TokenError::InvalidToken(format!(
            "{name} claim appears more than once"
        ))),
    }
}

fn single_string(authorizer: &mut Authorizer, name: &str) -> Result<String, TokenError> {
    single(query::<(String,)>(authorizer, name)?, name)
}

fn single_int(authorizer: &mut Authorizer, name: &str) -> Result<i64, TokenError> {
    single(query::<(i64,)>(authorizer, name)?, name)
}

fn single_bool(authorizer: &mut Authorizer, name: &str) -> Result<bool, TokenError> {
    single(query::<(bool,)>(authorizer, name)?, name)
}

fn reject_foreign_facts(authorizer: &mut Authorizer, kind: ClaimsKind) -> Result<(), TokenError> {
    for (name, kinds) in FACTS {
        if kinds.contains(&kind) {
            continue;
        }
        let rule: biscuit_auth::builder::Rule = format!("data(true) <- {name}($x)")
            .parse()
            .map_err(|e: BiscuitTokenError| TokenError::InvalidToken(e.to_string()))?;
        let present: Vec<(bool,)> = authorizer
            .query(rule)
            .map_err(|e| TokenError::InvalidToken(e.to_string()))?;
        if !present.is_empty() {
            return Err(TokenError::InvalidToken(format!(
                "{kind} token carries a {name} claim"
            )));
        }
    }
    Ok(())
}

impl From<DevicePrincipal> for Claims {
    fn from(device: DevicePrincipal) -> Self {
        Claims::device(device.fingerprint)
    }
}

impl From<ApiTokenPrincipal> for Claims {
    fn from(token: ApiTokenPrincipal) -> Self {
        Claims::api_token(token)
    }
}

// [libs/domain/authz/src/credentials.rs]
/*!
 * =================================================================
 * APARATO: CREDENTIAL ENGINE (V8.3 - PBKDF2 STRATA)
 * CLASIFICACIÓN: DOMAIN SECURITY (ESTRATO L2)
 * RESPONSABILIDAD: HASHING DE CONTRASEÑAS, ACUÑADO Y CLASIFICACIÓN DE TOKENS
 *
 * # Physics:
 * PBKDF2-HMAC-SHA256 con sal aleatoria de 16 bytes y 150.000
 * iteraciones transforma la contraseña en material de 256 bits. La
 * comparación es de tiempo constante sobre el material derivado. Los
 * tokens opacos (`sess_…`, `apik_…`) jamás se persisten: solo su
 * SHA-256 hex toca la base de datos.
 * =================================================================
 */

use crate::errors::AuthzError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Iteraciones PBKDF2 (sincronizado con la física WebCrypto del Dashboard).
const PBKDF2_ITERATIONS: u32 = 150_000;
const DERIVED_KEY_LENGTH_BYTES: usize = 32;
const SALT_LENGTH_BYTES: usize = 16;
const TOKEN_MATERIAL_BYTES: usize = 32;

/// Prefijo de token de sesión de corta vida.
pub const SESSION_TOKEN_PREFIX: &str = "sess_";
/// Prefijo de API key de larga vida.
pub const API_KEY_PREFIX: &str = "apik_";

/// Longitud mínima de contraseña admitida.
const PASSWORD_MIN_LENGTH: usize = 8;

/// Clase de una credencial Bearer presentada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Session,
    ApiKey,
    Unknown,
}

/// Clasifica un token Bearer por su prefijo soberano.
pub fn classify_bearer(token: &str) -> CredentialKind {
    if token.starts_with(SESSION_TOKEN_PREFIX) {
        CredentialKind::Session
    } else if token.starts_with(API_KEY_PREFIX) {
        CredentialKind::ApiKey
    } else {
        CredentialKind::Unknown
    }
}

/// Política mínima de robustez de contraseña.
pub fn is_password_strong_enough(candidate: &str) -> bool {
    candidate.len() >= PASSWORD_MIN_LENGTH
}

/// Deriva y sella una contraseña: `pbkdf2$sha256$<iter>$<salt>$<hash>`.
pub fn hash_password(plain_password: &str) -> String {
    let mut salt = [0u8; SALT_LENGTH_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut derived_key = [0u8; DERIVED_KEY_LENGTH_BYTES];
    pbkdf2_hmac::<Sha256>(plain_password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut derived_key);

    format!(
        "pbkdf2$sha256${}${}${}",
        PBKDF2_ITERATIONS,
        BASE64.encode(salt),
        BASE64.encode(derived_key)
    )
}

/// Verifica una contraseña contra su sello persistido.
///
/// La comparación del material derivado es de tiempo constante; un
/// sello malformado degrada a falso sin revelar la causa.
pub fn verify_password(plain_password: &str, stored_hash: &str) -> bool {
    let segments: Vec<&str> = stored_hash.split('$').collect();
    if segments.len() != 5 || segments[0] != "pbkdf2" || segments[1] != "sha256" {
        return false;
    }
    let iterations: u32 = match segments[2].parse() {
        Ok(value) => value,
        Err(_) => return false,
    };
    let salt = match BASE64.decode(segments[3]) {
        Ok(value) => value,
        Err(_) => return false,
    };
    let expected_key = match BASE64.decode(segments[4]) {
        Ok(value) => value,
        Err(_) => return false,
    };

    let mut derived_key = vec![0u8; expected_key.len().max(1)];
    pbkdf2_hmac::<Sha256>(plain_password.as_bytes(), &salt, iterations, &mut derived_key);

    constant_time_eq(&derived_key, &expected_key)
}

/// Comparación de tiempo constante byte a byte.
pub fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut accumulated_difference: u8 = 0;
    for (left_byte, right_byte) in left.iter().zip(right.iter()) {
        accumulated_difference |= left_byte ^ right_byte;
    }
    accumulated_difference == 0
}

/// Acuña un token de sesión opaco criptográficamente aleatorio.
pub fn mint_session_token() -> String {
    format!("{}{}", SESSION_TOKEN_PREFIX, random_token_material())
}

/// Acuña un API key opaco; regenerarlo invalida el anterior de inmediato.
pub fn mint_api_key() -> String {
    format!("{}{}", API_KEY_PREFIX, random_token_material())
}

fn random_token_material() -> String {
    let mut material = [0u8; TOKEN_MATERIAL_BYTES];
    rand::thread_rng().fill_bytes(&mut material);
    hex::encode(material)
}

/// SHA-256 hex de una credencial presentada: la única forma que se persiste.
pub fn credential_hash_hex(presented_credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(presented_credential.as_bytes());
    hex::encode(hasher.finalize())
}

/// Valida la política de contraseña devolviendo el fallo tipado.
pub fn enforce_password_policy(candidate: &str) -> Result<(), AuthzError> {
    if is_password_strong_enough(candidate) {
        Ok(())
    } else {
        Err(AuthzError::PasswordTooWeak)
    }
}

// FIN DEL ARCHIVO [libs/domain/authz/src/credentials.rs]

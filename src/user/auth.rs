//! Password hashing
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod vgs_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash<T: AsRef<str>>(plain: &[u8], b64_salt: T) -> Result<String> {
        let argon2 = Argon2::default();
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
        let hash_string = argon2
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    /// Parameters are read from the PHC string, not from `Argon2::default()`.
    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let argon2 = Argon2::default();
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(argon2.verify_password(plain_pw, &password_hash).is_ok())
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum VgsHasher {
    #[default]
    Argon2,
}

impl FromStr for VgsHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(VgsHasher::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl fmt::Display for VgsHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VgsHasher::Argon2 => write!(f, "argon2"),
        }
    }
}

impl VgsHasher {
    /// Picks the hasher that produced a PHC string.
    pub fn for_hash(phc: &str) -> Result<VgsHasher> {
        match phc.split('$').nth(1) {
            Some(id) if id.starts_with("argon2") => Ok(VgsHasher::Argon2),
            Some(id) => bail!("Unsupported password hash algorithm {}", id),
            None => bail!("Password hash is not in PHC format"),
        }
    }

    pub fn generate_b64_salt(&self) -> String {
        match self {
            VgsHasher::Argon2 => vgs_argon2::generate_b64_salt(),
        }
    }

    pub fn hash<T: AsRef<str>>(&self, plain: &[u8], b64_salt: T) -> Result<String> {
        match self {
            VgsHasher::Argon2 => vgs_argon2::hash(plain, b64_salt),
        }
    }

    /// Hashes with a fresh salt.
    pub fn hash_password<T: AsRef<str>>(&self, plain: T) -> Result<String> {
        self.hash(plain.as_ref().as_bytes(), self.generate_b64_salt())
    }

    pub fn verify<T: AsRef<str>>(&self, plain_pw: T, target_hash: T) -> Result<bool> {
        match self {
            VgsHasher::Argon2 => vgs_argon2::verify(plain_pw.as_ref().as_bytes(), target_hash),
        }
    }
}

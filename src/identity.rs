//! Principal identities for custodians, viewers and the administrator
use bech32::Bech32m;
use std::fmt;
use uuid7::uuid7;

/// An opaque, comparable identity. The registry never interprets its contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Principal(String);

impl Principal {
    /// Wrap an identity supplied by the caller's environment
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    // mint a fresh uuid7 then encode it under the given prefix using bech32m
    pub fn generate(hrp: &str) -> anyhow::Result<Self> {
        let hrp = bech32::Hrp::parse(hrp)?;
        let encoded = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
        Ok(Self(encoded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<C> minicbor::Encode<C> for Principal {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(&self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Principal {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(Principal(d.str()?.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_encoding() {
        let original = Principal::generate("user_").unwrap();

        let encoding = minicbor::to_vec(&original).unwrap();
        let decode: Principal = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn generated_principals_carry_prefix() {
        let a = Principal::generate("user_").unwrap();
        let b = Principal::generate("user_").unwrap();

        assert!(a.as_str().starts_with("user_1"));
        assert_ne!(a, b);
    }

    #[test]
    fn empty_prefix_is_rejected() {
        assert!(Principal::generate("").is_err());
    }
}

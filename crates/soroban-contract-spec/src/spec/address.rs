use stellar_strkey::{ed25519, Contract, Strkey};
use stellar_xdr::curr::{
    AccountId, ContractId, Hash, MuxedEd25519Account, PublicKey, ScAddress, Uint256,
};

use crate::error::{EncodingError, Result, SpecError};

/// Parse an account (`G...`), contract (`C...`) or, when `allow_muxed`,
/// muxed account (`M...`) strkey. A bare 64-character hex string is read
/// as a raw contract id.
pub(crate) fn parse(s: &str, allow_muxed: bool) -> Result<ScAddress> {
    if s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        let mut id = [0u8; 32];
        hex::decode_to_slice(s, &mut id)
            .map_err(|_| EncodingError::InvalidAddress(s.to_string()))?;
        return Ok(ScAddress::Contract(ContractId(Hash(id))));
    }

    match Strkey::from_string(s).map_err(|_| EncodingError::InvalidAddress(s.to_string()))? {
        Strkey::PublicKeyEd25519(ed25519::PublicKey(key)) => Ok(ScAddress::Account(AccountId(
            PublicKey::PublicKeyTypeEd25519(Uint256(key)),
        ))),
        Strkey::Contract(Contract(id)) => Ok(ScAddress::Contract(ContractId(Hash(id)))),
        Strkey::MuxedAccountEd25519(m) if allow_muxed => {
            Ok(ScAddress::MuxedAccount(MuxedEd25519Account {
                id: m.id,
                ed25519: Uint256(m.ed25519),
            }))
        }
        Strkey::MuxedAccountEd25519(_) => Err(SpecError::invalid_type(format!(
            "muxed account {s} is only accepted for MuxedAddress"
        ))),
        _ => Err(EncodingError::InvalidAddress(s.to_string()).into()),
    }
}

/// Render an address as its strkey.
pub(crate) fn to_strkey(addr: &ScAddress) -> Result<String> {
    let key = match addr {
        ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key)))) => {
            Strkey::PublicKeyEd25519(ed25519::PublicKey(*key))
        }
        ScAddress::Contract(ContractId(Hash(id))) => Strkey::Contract(Contract(*id)),
        ScAddress::MuxedAccount(m) => Strkey::MuxedAccountEd25519(ed25519::MuxedAccount {
            ed25519: m.ed25519.0,
            id: m.id,
        }),
        other => {
            return Err(SpecError::invalid_type(format!(
                "unsupported address kind {other:?}"
            )))
        }
    };
    Ok(key.to_string())
}

use crate::foundation::FlowTxError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const FUSD_SETUP_ACCOUNT_CODE: &str = include_str!("../../cadence/transactions/fusd/setup_account.cdc");

/// Supported transactions, named `CONTRACT_TRANSACTION` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    FusdSetupAccount,
}

impl TransactionKind {
    pub const ALL: &'static [TransactionKind] = &[TransactionKind::FusdSetupAccount];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::FusdSetupAccount => "FUSD_SETUP_ACCOUNT",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::FusdSetupAccount => FUSD_SETUP_ACCOUNT_CODE,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for TransactionKind {
    type Err = FlowTxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.wire_name() == s)
            .ok_or_else(|| FlowTxError::UnknownTransactionKind(s.to_string()))
    }
}

/// Contract placeholder name -> deployed address.
pub type ImportMap = BTreeMap<String, String>;

pub fn import_map(fungible_token_address: &str, fusd_address: &str) -> ImportMap {
    let mut imports = ImportMap::new();
    imports.insert("FungibleToken".to_string(), fungible_token_address.to_string());
    imports.insert("FUSD".to_string(), fusd_address.to_string());
    imports
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub kind: TransactionKind,
    pub code: &'static str,
    pub imports: ImportMap,
}

/// Resolves a command's transaction kind to its compiled-in code and import map.
#[derive(Clone, Debug)]
pub struct TemplateRegistry {
    imports: ImportMap,
}

impl TemplateRegistry {
    pub fn new(imports: ImportMap) -> Self {
        Self { imports }
    }

    pub fn resolve(&self, kind: &str) -> Result<ResolvedTemplate, FlowTxError> {
        let kind = TransactionKind::from_str(kind)?;
        Ok(ResolvedTemplate { kind, code: kind.code(), imports: self.imports.clone() })
    }
}

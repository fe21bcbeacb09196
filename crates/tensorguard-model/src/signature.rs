//! Function signatures
//!
//! The ordered parameter contracts and optional return contract of one
//! guarded function. Built once at declaration time and shared read-only by
//! every call.

use crate::contract::TensorContract;

/// One declared parameter; `contract` is `None` for non-tensor parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamContract {
    pub name: String,
    pub contract: Option<TensorContract>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<ParamContract>,
    ret: Option<TensorContract>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tensor parameter
    pub fn param(mut self, name: impl Into<String>, contract: TensorContract) -> Self {
        self.params.push(ParamContract {
            name: name.into(),
            contract: Some(contract),
        });
        self
    }

    /// Append a parameter that is listed but never checked
    pub fn untyped_param(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamContract {
            name: name.into(),
            contract: None,
        });
        self
    }

    pub fn returns(mut self, contract: TensorContract) -> Self {
        self.ret = Some(contract);
        self
    }

    pub fn params(&self) -> &[ParamContract] {
        &self.params
    }

    pub fn ret(&self) -> Option<&TensorContract> {
        self.ret.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractSpec;
    use crate::registry::Registry;

    #[test]
    fn test_signature_order() {
        let reg = Registry::global();
        let sig = Signature::new()
            .param("x", ContractSpec::new().dtype("float32").build(reg).unwrap())
            .untyped_param("scale")
            .param("y", TensorContract::any())
            .returns(TensorContract::any());

        let names: Vec<&str> = sig.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["x", "scale", "y"]);
        assert!(sig.params()[1].contract.is_none());
        assert!(sig.ret().is_some());
    }
}

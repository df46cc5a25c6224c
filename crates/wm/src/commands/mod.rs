//! CLI command implementations.

pub(crate) mod check_policy;
pub(crate) mod convert;

pub(crate) use check_policy::CheckPolicyArgs;
pub(crate) use convert::ConvertArgs;

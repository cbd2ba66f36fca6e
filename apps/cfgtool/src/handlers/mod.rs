pub(crate) mod convert;
pub(crate) mod edit;
pub(crate) mod inspect;
pub(crate) mod project;

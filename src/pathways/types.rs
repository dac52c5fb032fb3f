// a gene/protein token as typed by the user
pub type Token = String;

// an identifier after conversion to the target namespace, eg. "7157"
pub type CanonicalId = String;

pub type NodeId = String;
pub type PubmedId = String;
pub type MediatorId = String;

pub type NamespaceName = String;
pub type NamespaceCode = String;

pub type DataSourceUri = String;

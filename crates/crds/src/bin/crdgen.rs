//! Prints the KTwin CRDs as a multi-document YAML stream.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crds.yaml`

use crds::{EventStore, TwinInstance, TwinInterface};
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    let documents = [
        serde_yaml::to_string(&TwinInterface::crd())?,
        serde_yaml::to_string(&TwinInstance::crd())?,
        serde_yaml::to_string(&EventStore::crd())?,
    ];
    println!("{}", documents.join("---\n"));
    Ok(())
}

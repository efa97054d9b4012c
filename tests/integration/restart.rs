//! Durability across restarts of a Fjall-backed node.

use strata_ledger::Verifier;
use strata_integration_tests::TestNode;

#[tokio::test]
async fn test_trusted_root_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut verifier = Verifier::new();

    {
        let node = TestNode::fjall(dir.path());
        for i in 0..10u8 {
            let key = [b'k', i % 3];
            let receipt = node.safe_set(&key, &[i], verifier.trusted_root()).await;
            verifier.verify_set(&key, &[i], &receipt).unwrap();
        }
        let receipt = node.safe_reference(b"alias", b"k\x01", verifier.trusted_root()).await;
        verifier.verify_reference(b"alias", b"k\x01", &receipt).unwrap();
    }

    let node = TestNode::fjall(dir.path());
    assert_eq!(node.root().await, verifier.trusted_root().unwrap());
    node.ledger.audit().unwrap();

    let got = node.safe_get(b"alias", verifier.trusted_root()).await;
    verifier.verify_get(b"alias", &got).unwrap();
    assert_eq!(got.value, vec![7]);

    // writing continues from the next index, consistent with the old root
    let receipt = node.safe_set(b"after", b"restart", verifier.trusted_root()).await;
    assert_eq!(receipt.index, 11);
    verifier.verify_set(b"after", b"restart", &receipt).unwrap();
}

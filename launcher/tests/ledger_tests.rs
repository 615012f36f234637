//! Pledge ledger integration tests

mod common;

use alloy_primitives::{address, Address, B256};
use anyhow::Result;
use coinfluence_core::{Currency, LaunchStatus};
use coinfluence_launcher::core::{LaunchEventKind, PledgeId};
use coinfluence_launcher::LaunchError;
use common::*;
use proptest::prelude::*;
use std::collections::HashSet;

const INFLUENCER: Address = address!("0x1111111111111111111111111111111111111111");

#[tokio::test]
async fn test_pledge_updates_aggregates() -> Result<()> {
    let h = Harness::new();
    h.register(INFLUENCER, 10 * ETHER).await;

    let tx_hash = B256::repeat_byte(0xaa);
    let first = h
        .ledger
        .submit_pledge(INFLUENCER, PLEDGER, 2 * ETHER, Currency::Eth, Some(tx_hash))
        .await?;
    h.ledger
        .submit_pledge(INFLUENCER, PLEDGER, ETHER, Currency::Eth, None)
        .await?;
    h.ledger
        .submit_pledge(INFLUENCER, Address::repeat_byte(0x22), 5_000_000, Currency::Usdc, None)
        .await?;

    let launch = h.ledger.launch(INFLUENCER).await?;
    assert_eq!(launch.total_pledged_eth, 3 * ETHER);
    assert_eq!(launch.total_pledged_usdc, 5_000_000);
    // Distinct pledgers, not pledges
    assert_eq!(launch.pledger_count, 2);
    assert_eq!(launch.status, LaunchStatus::Collecting);

    let pledge = h.ledger.pledge(first).await?;
    assert_eq!(pledge.tx_hash, Some(tx_hash));
    assert_eq!(pledge.amount, 2 * ETHER);
    assert!(pledge.is_active());

    assert_eq!(h.ledger.pledges_for(INFLUENCER).await?.len(), 3);
    assert_eq!(h.ledger.pledges_by(PLEDGER).await?.len(), 2);

    let progress = h.ledger.progress(INFLUENCER).await?;
    assert_eq!(progress.eth_bps, 3_000);
    assert!(!progress.threshold_met);
    Ok(())
}

#[tokio::test]
async fn test_pledge_validation() -> Result<()> {
    let h = Harness::new();
    h.register(INFLUENCER, ETHER).await;

    let zero = h
        .ledger
        .submit_pledge(INFLUENCER, PLEDGER, 0, Currency::Eth, None)
        .await;
    assert!(matches!(zero, Err(LaunchError::InvalidAmount)));

    let unknown = h
        .ledger
        .submit_pledge(Address::repeat_byte(0x99), PLEDGER, ETHER, Currency::Eth, None)
        .await;
    assert!(matches!(unknown, Err(LaunchError::UnknownInfluencer(_))));

    let missing = h.ledger.withdraw_pledge(PledgeId::new()).await;
    assert!(matches!(missing, Err(LaunchError::NotFound(_))));

    let duplicate = h.ledger.register_launch(new_launch(INFLUENCER, ETHER)).await;
    assert!(matches!(duplicate, Err(LaunchError::AlreadyRegistered(_))));
    Ok(())
}

#[tokio::test]
async fn test_redelivered_transfer_is_credited_once() -> Result<()> {
    let h = Harness::new();
    h.register(INFLUENCER, 3 * ETHER).await;

    let tx_hash = B256::repeat_byte(0xaa);
    let first = h
        .ledger
        .submit_pledge(INFLUENCER, PLEDGER, 2 * ETHER, Currency::Eth, Some(tx_hash))
        .await?;
    let replay = h
        .ledger
        .submit_pledge(INFLUENCER, PLEDGER, 2 * ETHER, Currency::Eth, Some(tx_hash))
        .await?;
    assert_eq!(replay, first);

    let launch = h.ledger.launch(INFLUENCER).await?;
    assert_eq!(launch.total_pledged_eth, 2 * ETHER);
    assert_eq!(launch.status, LaunchStatus::Collecting);
    assert_eq!(h.ledger.pledges_for(INFLUENCER).await?.len(), 1);

    // The same hash cannot back a different transfer
    let reused = h
        .ledger
        .submit_pledge(INFLUENCER, PLEDGER, ETHER, Currency::Eth, Some(tx_hash))
        .await;
    assert!(matches!(reused, Err(LaunchError::DuplicateTransaction(hash)) if hash == tx_hash));

    // Nor be re-credited after its pledge was withdrawn
    h.ledger.withdraw_pledge(first).await?;
    let after_withdrawal = h
        .ledger
        .submit_pledge(INFLUENCER, PLEDGER, 2 * ETHER, Currency::Eth, Some(tx_hash))
        .await?;
    assert_eq!(after_withdrawal, first);
    assert_eq!(h.ledger.launch(INFLUENCER).await?.total_pledged_eth, 0);
    Ok(())
}

#[tokio::test]
async fn test_unknown_influencer_leaves_no_lock_entry() -> Result<()> {
    let h = Harness::new();
    h.register(INFLUENCER, ETHER).await;

    for byte in 0x40..0x60 {
        let result = h
            .ledger
            .submit_pledge(Address::repeat_byte(byte), PLEDGER, ETHER, Currency::Eth, None)
            .await;
        assert!(matches!(result, Err(LaunchError::UnknownInfluencer(_))));
    }
    assert!(h.locks.is_empty());

    h.ledger
        .submit_pledge(INFLUENCER, PLEDGER, ETHER, Currency::Eth, None)
        .await?;
    assert!(h.locks.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_threshold_met_survives_withdrawal() -> Result<()> {
    let h = Harness::new();
    h.register(INFLUENCER, ETHER).await;

    let id = h
        .ledger
        .submit_pledge(INFLUENCER, PLEDGER, ETHER, Currency::Eth, None)
        .await?;
    assert_eq!(h.ledger.launch(INFLUENCER).await?.status, LaunchStatus::ThresholdMet);

    h.ledger.withdraw_pledge(id).await?;
    let launch = h.ledger.launch(INFLUENCER).await?;
    assert_eq!(launch.total_pledged_eth, 0);
    assert_eq!(launch.status, LaunchStatus::ThresholdMet);

    let events = h.ledger.events(INFLUENCER).await?;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, LaunchEventKind::ThresholdMet);
    Ok(())
}

#[tokio::test]
async fn test_usdc_threshold_triggers_alone() -> Result<()> {
    let h = Harness::new();
    let mut params = new_launch(INFLUENCER, 0);
    params.threshold_usdc = 1_000_000;
    h.ledger.register_launch(params).await?;

    // A zero ETH threshold is not configured and never triggers
    h.ledger
        .submit_pledge(INFLUENCER, PLEDGER, ETHER, Currency::Eth, None)
        .await?;
    assert_eq!(h.ledger.launch(INFLUENCER).await?.status, LaunchStatus::Collecting);

    h.ledger
        .submit_pledge(INFLUENCER, PLEDGER, 1_000_000, Currency::Usdc, None)
        .await?;
    assert_eq!(h.ledger.launch(INFLUENCER).await?.status, LaunchStatus::ThresholdMet);
    Ok(())
}

#[tokio::test]
async fn test_second_withdrawal_is_rejected() -> Result<()> {
    let h = Harness::new();
    h.register(INFLUENCER, 10 * ETHER).await;

    let keep = h
        .ledger
        .submit_pledge(INFLUENCER, PLEDGER, 3 * ETHER, Currency::Eth, None)
        .await?;
    let id = h
        .ledger
        .submit_pledge(INFLUENCER, PLEDGER, 2 * ETHER, Currency::Eth, None)
        .await?;

    let withdrawn = h.ledger.withdraw_pledge(id).await?;
    assert!(withdrawn.withdrawn);
    assert!(withdrawn.withdrawn_at.is_some());
    assert_eq!(h.ledger.launch(INFLUENCER).await?.total_pledged_eth, 3 * ETHER);

    let again = h.ledger.withdraw_pledge(id).await;
    assert!(matches!(again, Err(LaunchError::AlreadyWithdrawn(_))));
    assert_eq!(h.ledger.launch(INFLUENCER).await?.total_pledged_eth, 3 * ETHER);
    assert!(h.ledger.pledge(keep).await?.is_active());
    Ok(())
}

#[tokio::test]
async fn test_ledger_frozen_after_launch() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;
    let pledge_id = h.ledger.pledges_for(INFLUENCER).await?[0].id;

    let token = h.existing_token(0x77);
    h.launches.launch(ADMIN, INFLUENCER, Some(token)).await?;

    let pledge = h
        .ledger
        .submit_pledge(INFLUENCER, PLEDGER, ETHER, Currency::Eth, None)
        .await;
    assert!(matches!(pledge, Err(LaunchError::LaunchClosed(_))));

    let withdrawal = h.ledger.withdraw_pledge(pledge_id).await;
    assert!(matches!(withdrawal, Err(LaunchError::LaunchClosed(_))));
    assert_eq!(h.ledger.launch(INFLUENCER).await?.total_pledged_eth, ETHER);
    Ok(())
}

#[tokio::test]
async fn test_platform_stats() -> Result<()> {
    let h = Harness::new();
    h.register(INFLUENCER, ETHER).await;
    h.register(Address::repeat_byte(0x12), 100 * ETHER).await;

    h.ledger
        .submit_pledge(INFLUENCER, PLEDGER, ETHER, Currency::Eth, None)
        .await?;
    h.ledger
        .submit_pledge(Address::repeat_byte(0x12), PLEDGER, 250_000, Currency::Usdc, None)
        .await?;

    let stats = h.ledger.stats().await?;
    assert_eq!(stats.launches, 2);
    assert_eq!(stats.pending_approval, 1);
    assert_eq!(stats.collecting, 1);
    assert_eq!(stats.total_pledged_eth, ETHER);
    assert_eq!(stats.total_pledged_usdc, 250_000);
    assert_eq!(stats.total_pledgers, 2);
    Ok(())
}

#[derive(Debug, Clone)]
struct PledgeOp {
    pledger: u8,
    amount: u64,
    usdc: bool,
    withdraw: bool,
}

fn op_strategy() -> impl Strategy<Value = PledgeOp> {
    (0u8..6, 1u64..1_000_000, any::<bool>(), any::<bool>()).prop_map(|(pledger, amount, usdc, withdraw)| PledgeOp {
        pledger,
        amount,
        usdc,
        withdraw,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn aggregates_match_active_pledges_under_concurrency(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let h = Harness::new();
            h.register(INFLUENCER, 1).await;

            let tasks: Vec<_> = ops
                .iter()
                .cloned()
                .map(|op| {
                    let ledger = h.ledger.clone();
                    tokio::spawn(async move {
                        let currency = if op.usdc { Currency::Usdc } else { Currency::Eth };
                        let pledger = Address::repeat_byte(0x30 + op.pledger);
                        let id = ledger
                            .submit_pledge(INFLUENCER, pledger, op.amount as u128, currency, None)
                            .await
                            .unwrap();
                        if op.withdraw {
                            ledger.withdraw_pledge(id).await.unwrap();
                        }
                    })
                })
                .collect();
            for result in futures::future::join_all(tasks).await {
                result.unwrap();
            }

            let launch = h.ledger.launch(INFLUENCER).await.unwrap();
            let pledges = h.ledger.pledges_for(INFLUENCER).await.unwrap();
            let active = |currency: Currency| -> u128 {
                pledges
                    .iter()
                    .filter(|p| p.is_active() && p.currency == currency)
                    .map(|p| p.amount)
                    .sum()
            };

            assert_eq!(pledges.len(), ops.len());
            assert_eq!(launch.total_pledged_eth, active(Currency::Eth));
            assert_eq!(launch.total_pledged_usdc, active(Currency::Usdc));

            let pledgers: HashSet<u8> = ops.iter().map(|op| op.pledger).collect();
            assert_eq!(launch.pledger_count, pledgers.len() as u64);

            // Any ETH pledge crossed the 1 wei threshold at some point
            if ops.iter().any(|op| !op.usdc) {
                assert_eq!(launch.status, LaunchStatus::ThresholdMet);
            }
            assert!(h.locks.is_empty());
        });
    }
}

//! End-to-end launch tests against the simulated chain

mod common;

use alloy_primitives::{address, Address, U256};
use anyhow::Result;
use coinfluence_core::math::encode_sqrt_price_x96;
use coinfluence_core::{FeeTier, LaunchStatus, TokenPair};
use coinfluence_launcher::adapters::chain::{Fault, SIMULATED_PLATFORM_WALLET};
use coinfluence_launcher::core::{BootstrapFailure, BootstrapStep, ChainError, ChainPort, LaunchEventKind};
use coinfluence_launcher::LaunchError;
use common::*;
use std::time::Duration;

const INFLUENCER: Address = address!("0x1111111111111111111111111111111111111111");

fn bootstrap_failure(err: LaunchError) -> BootstrapFailure {
    match err {
        LaunchError::Bootstrap(failure) => failure,
        other => panic!("expected a bootstrap failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_launch_through_token_factory() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;

    let outcome = h.launches.launch(ADMIN, INFLUENCER, None).await?;
    let launch = outcome.launch;
    assert_eq!(launch.status, LaunchStatus::Launched);
    assert!(launch.launched_at.is_some());
    assert!(launch.token_deployment_tx.is_none());

    let token = launch.token_address.expect("token address");
    let record = outcome.bootstrap;
    assert_eq!(record.target_asset, token);
    assert_eq!(launch.pool_address, record.pool_address);
    assert_eq!(record.step, BootstrapStep::Complete);
    assert_eq!(record.attempts, 1);
    assert!(record.position.is_some());
    assert!(record.completed_at.is_some());

    // 30 / 65 / 5 split of the default supply
    let supply = h.config.token.total_supply;
    assert_eq!(h.chain.token_balance(token, INFLUENCER).await?, U256::from(supply * 30 / 100));
    assert_eq!(
        h.chain.token_balance(token, SIMULATED_PLATFORM_WALLET).await?,
        U256::from(supply * 5 / 100)
    );
    assert_eq!(h.chain.pool_count(), 1);
    assert_eq!(h.chain.position_count(), 1);

    let kinds: Vec<_> = h.ledger.events(INFLUENCER).await?.into_iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LaunchEventKind::ThresholdMet,
            LaunchEventKind::Approved,
            LaunchEventKind::TokenCreated,
            LaunchEventKind::LiquidityCreated,
            LaunchEventKind::Launched,
        ]
    );
    assert_eq!(h.metrics.launches_completed.get(), 1);
    Ok(())
}

#[tokio::test]
async fn test_launch_with_supplied_token() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;
    let token = h.existing_token(0x77);

    let outcome = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await?;
    assert_eq!(outcome.launch.token_address, Some(token));
    assert_eq!(h.chain.submissions("create_token"), 0);

    let position = outcome.bootstrap.position.expect("position");
    let pair = TokenPair::canonical(token, h.config.chain.base_asset)?;
    let range = outcome.bootstrap.tick_range.expect("tick range");
    assert_eq!(range.lower % 60, 0);
    assert_eq!(range.upper % 60, 0);
    let found = h
        .chain
        .find_position(LAUNCHER, &pair, FeeTier::MEDIUM, range)
        .await?
        .expect("position on chain");
    assert_eq!(found.token_id, position.token_id);
    Ok(())
}

#[tokio::test]
async fn test_launch_guards() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.register(INFLUENCER, ETHER).await;
    let token = h.existing_token(0x77);

    let early_approval = h.launches.approve(ADMIN, INFLUENCER).await;
    assert!(matches!(early_approval, Err(LaunchError::NotThresholdMet(_))));

    h.ledger
        .submit_pledge(INFLUENCER, PLEDGER, ETHER, coinfluence_core::Currency::Eth, None)
        .await?;
    let not_approved = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await;
    assert!(matches!(not_approved, Err(LaunchError::NotApproved(_))));

    let outsider = h.launches.approve(PLEDGER, INFLUENCER).await;
    assert!(matches!(outsider, Err(LaunchError::Unauthorized { .. })));

    let approved = h.launches.approve(ADMIN, INFLUENCER).await?;
    assert_eq!(approved.approved_by, Some(ADMIN));
    // Approving twice is a no-op
    let again = h.launches.approve(ADMIN, INFLUENCER).await?;
    assert_eq!(again.version, approved.version);

    let zero = h.launches.launch(ADMIN, INFLUENCER, Some(Address::ZERO)).await;
    assert!(matches!(zero, Err(LaunchError::InvalidParameters(_))));

    h.launches.launch(ADMIN, INFLUENCER, Some(token)).await?;
    let twice = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await;
    assert!(matches!(twice, Err(LaunchError::AlreadyLaunched(_))));
    assert_eq!(h.chain.position_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_mint_failure_leaves_launch_approved_and_retry_reuses_pool() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;
    let token = h.existing_token(0x77);

    h.chain.inject_fault("mint", Fault::Revert);
    let failure = bootstrap_failure(h.launches.launch(ADMIN, INFLUENCER, Some(token)).await.unwrap_err());
    assert_eq!(failure.step, BootstrapStep::Mint);
    assert!(failure.state_mutated);
    assert!(matches!(*failure.source, LaunchError::TransactionReverted { call: "mint", .. }));

    let launch = h.ledger.launch(INFLUENCER).await?;
    assert_eq!(launch.status, LaunchStatus::Approved);
    assert!(launch.pool_address.is_none());

    let record = h.launches.bootstrap_record(INFLUENCER).await?.expect("bootstrap record");
    assert!(record.pool_address.is_some());
    assert!(record.last_error.is_some());
    assert_eq!(h.chain.pool_count(), 1);

    let outcome = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await?;
    assert_eq!(outcome.launch.status, LaunchStatus::Launched);
    assert_eq!(outcome.bootstrap.attempts, 2);
    assert_eq!(h.chain.pool_count(), 1);
    assert_eq!(h.chain.submissions("create_pool"), 1);
    assert_eq!(h.chain.submissions("mint"), 2);
    assert_eq!(h.chain.position_count(), 1);

    let kinds: Vec<_> = h.ledger.events(INFLUENCER).await?.into_iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&LaunchEventKind::LiquidityFailed));
    assert_eq!(kinds.last(), Some(&LaunchEventKind::Launched));
    Ok(())
}

#[tokio::test]
async fn test_transient_outage_is_retried() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;
    let token = h.existing_token(0x77);

    h.chain.inject_fault("create_pool", Fault::Unavailable);
    h.chain.inject_fault("allowance", Fault::Unavailable);

    let outcome = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await?;
    assert_eq!(outcome.launch.status, LaunchStatus::Launched);
    assert_eq!(h.chain.submissions("create_pool"), 2);
    assert_eq!(h.chain.pool_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_insufficient_balances_abort_before_mint() -> Result<()> {
    let h = Harness::new();
    h.approved_launch(INFLUENCER).await;
    let token = Address::repeat_byte(0x77);
    h.chain.mint_tokens(token, LAUNCHER, U256::from(h.token_seed() - 1));

    let failure = bootstrap_failure(h.launches.launch(ADMIN, INFLUENCER, Some(token)).await.unwrap_err());
    assert_eq!(failure.step, BootstrapStep::Authorize);
    assert!(matches!(*failure.source, LaunchError::InsufficientBalance { asset, .. } if asset == token));

    // Tokens are there now, but no native balance for the base side
    h.chain.mint_tokens(token, LAUNCHER, U256::from(1u64));
    let failure = bootstrap_failure(h.launches.launch(ADMIN, INFLUENCER, Some(token)).await.unwrap_err());
    assert_eq!(failure.step, BootstrapStep::Authorize);
    assert!(matches!(
        *failure.source,
        LaunchError::InsufficientBalance { asset, .. } if asset == h.config.chain.base_asset
    ));

    assert_eq!(h.ledger.launch(INFLUENCER).await?.status, LaunchStatus::Approved);
    assert_eq!(h.chain.submissions("mint"), 0);

    h.fund_launcher();
    let outcome = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await?;
    assert_eq!(outcome.launch.status, LaunchStatus::Launched);
    assert_eq!(h.chain.pool_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_existing_pool_is_reused() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;
    let token = h.existing_token(0x77);

    let pair = TokenPair::canonical(token, h.config.chain.base_asset)?;
    let (amount0, amount1) = if pair.token0 == token {
        (h.token_seed(), h.config.liquidity.base_amount)
    } else {
        (h.config.liquidity.base_amount, h.token_seed())
    };
    let pool = h
        .chain
        .create_pool_externally(pair, FeeTier::MEDIUM, encode_sqrt_price_x96(amount1, amount0)?);

    let outcome = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await?;
    assert_eq!(outcome.launch.pool_address, Some(pool));
    assert_eq!(h.chain.submissions("create_pool"), 0);
    assert_eq!(h.chain.pool_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_uninitialized_pool_is_initialized() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;
    let token = h.existing_token(0x77);

    let pair = TokenPair::canonical(token, h.config.chain.base_asset)?;
    let pool = h.chain.create_pool_externally(pair, FeeTier::MEDIUM, U256::ZERO);

    let outcome = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await?;
    assert_eq!(outcome.launch.pool_address, Some(pool));
    assert_eq!(h.chain.submissions("create_pool"), 1);
    assert_eq!(h.chain.pool_count(), 1);
    assert!(!h.chain.pool_sqrt_price(pool).await?.is_zero());
    Ok(())
}

#[tokio::test]
async fn test_dropped_mint_waits_for_deadline_then_remints() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;
    let token = h.existing_token(0x77);

    h.chain.inject_fault("mint", Fault::Drop);
    let failure = bootstrap_failure(h.launches.launch(ADMIN, INFLUENCER, Some(token)).await.unwrap_err());
    assert_eq!(failure.step, BootstrapStep::Mint);
    assert!(matches!(
        *failure.source,
        LaunchError::Chain(ChainError::ConfirmationTimeout(_))
    ));
    let pending = h
        .launches
        .bootstrap_record(INFLUENCER)
        .await?
        .and_then(|record| record.mint)
        .expect("recorded mint submission");

    // Deadline still live: wait again, never resubmit
    let failure = bootstrap_failure(h.launches.launch(ADMIN, INFLUENCER, Some(token)).await.unwrap_err());
    assert_eq!(failure.step, BootstrapStep::Mint);
    assert_eq!(h.chain.submissions("mint"), 1);

    h.chain.advance_time(h.config.liquidity.deadline_secs + 60);
    let outcome = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await?;
    assert_eq!(outcome.launch.status, LaunchStatus::Launched);
    assert_eq!(h.chain.submissions("mint"), 2);
    assert_eq!(h.chain.position_count(), 1);

    let position = outcome.bootstrap.position.expect("position");
    assert_ne!(position.tx_hash, pending.tx_hash);
    assert!(outcome.bootstrap.mint.expect("mint submission").deadline > pending.deadline);
    Ok(())
}

#[tokio::test]
async fn test_lost_mint_response_never_double_mints() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;
    let token = h.existing_token(0x77);

    // Mined on chain, but the caller never learns the hash
    h.chain.inject_fault("mint", Fault::Lost);
    let failure = bootstrap_failure(h.launches.launch(ADMIN, INFLUENCER, Some(token)).await.unwrap_err());
    assert_eq!(failure.step, BootstrapStep::Mint);
    assert!(failure.state_mutated);
    assert!(failure.source.is_transient());
    let record = h.launches.bootstrap_record(INFLUENCER).await?.expect("bootstrap record");
    assert!(record.mint.is_none());
    assert!(record.mint_intent.is_some());
    assert_eq!(h.chain.position_count(), 1);

    let outcome = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await?;
    assert_eq!(outcome.launch.status, LaunchStatus::Launched);
    assert!(outcome.bootstrap.mint_intent.is_none());
    assert_eq!(h.chain.submissions("mint"), 1);
    assert_eq!(h.chain.position_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unresolved_mint_intent_waits_for_deadline() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;
    let token = h.existing_token(0x77);

    h.chain.inject_fault("mint", Fault::Unavailable);
    bootstrap_failure(h.launches.launch(ADMIN, INFLUENCER, Some(token)).await.unwrap_err());
    let intent = h
        .launches
        .bootstrap_record(INFLUENCER)
        .await?
        .and_then(|record| record.mint_intent)
        .expect("recorded mint intent");

    // The submission could still land: no second mint before its deadline
    let failure = bootstrap_failure(h.launches.launch(ADMIN, INFLUENCER, Some(token)).await.unwrap_err());
    assert_eq!(failure.step, BootstrapStep::Mint);
    assert!(matches!(
        *failure.source,
        LaunchError::Chain(ChainError::SubmissionPending(deadline)) if deadline == intent.deadline
    ));
    assert_eq!(h.chain.submissions("mint"), 1);

    h.chain.advance_time(h.config.liquidity.deadline_secs + 60);
    let outcome = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await?;
    assert_eq!(outcome.launch.status, LaunchStatus::Launched);
    assert_eq!(h.chain.submissions("mint"), 2);
    assert_eq!(h.chain.position_count(), 1);
    assert!(outcome.bootstrap.mint.expect("mint submission").deadline > intent.deadline);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_launch_is_rejected() -> Result<()> {
    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;
    let token = h.existing_token(0x77);

    // Keeps the first launch waiting on confirmations
    h.chain.inject_fault("mint", Fault::Drop);
    let launches = h.launches.clone();
    let first = tokio::spawn(async move { launches.launch(ADMIN, INFLUENCER, Some(token)).await });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(h.launches.coordinator().is_in_flight(&INFLUENCER));
    let second = h.launches.launch(ADMIN, INFLUENCER, Some(token)).await;
    assert!(matches!(second, Err(LaunchError::BootstrapInFlight(_))));

    assert!(first.await?.is_err());
    assert!(!h.launches.coordinator().is_in_flight(&INFLUENCER));
    assert_eq!(h.chain.submissions("mint"), 1);
    Ok(())
}

#[tokio::test]
async fn test_token_factory_failures() -> Result<()> {
    let mut config = test_config();
    config.chain.token_factory = None;
    let h = Harness::with_config(config);
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;

    let missing = bootstrap_failure(h.launches.launch(ADMIN, INFLUENCER, None).await.unwrap_err());
    assert_eq!(missing.step, BootstrapStep::CreateToken);
    assert!(!missing.state_mutated);
    assert!(matches!(*missing.source, LaunchError::TokenFactoryMissing));
    assert_eq!(h.ledger.launch(INFLUENCER).await?.status, LaunchStatus::Approved);

    let h = Harness::new();
    h.fund_launcher();
    h.approved_launch(INFLUENCER).await;

    // Rejected before broadcast: nothing recorded
    h.chain.inject_fault("create_token", Fault::Unavailable);
    let unavailable = bootstrap_failure(h.launches.launch(ADMIN, INFLUENCER, None).await.unwrap_err());
    assert_eq!(unavailable.step, BootstrapStep::CreateToken);
    assert!(!unavailable.state_mutated);
    assert!(unavailable.source.is_transient());
    assert!(h.ledger.launch(INFLUENCER).await?.token_deployment_tx.is_none());

    h.chain.inject_fault("create_token", Fault::Revert);
    let reverted = bootstrap_failure(h.launches.launch(ADMIN, INFLUENCER, None).await.unwrap_err());
    assert_eq!(reverted.step, BootstrapStep::CreateToken);
    assert!(reverted.state_mutated);
    assert!(matches!(
        *reverted.source,
        LaunchError::TransactionReverted { call: "create_token", .. }
    ));
    let launch = h.ledger.launch(INFLUENCER).await?;
    assert_eq!(launch.status, LaunchStatus::Approved);
    assert!(launch.token_deployment_tx.is_none());

    let failures: Vec<_> = h
        .ledger
        .events(INFLUENCER)
        .await?
        .into_iter()
        .filter(|event| event.kind == LaunchEventKind::LiquidityFailed)
        .collect();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[1].payload["step"], "create_token");
    assert_eq!(failures[1].payload["state_mutated"], true);

    let outcome = h.launches.launch(ADMIN, INFLUENCER, None).await?;
    assert_eq!(outcome.launch.status, LaunchStatus::Launched);
    assert_eq!(h.chain.submissions("create_token"), 3);
    Ok(())
}

use std::ops::Add;
use std::time::Duration;

use super::*;

fn handler_pair() -> (Handler, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Some(Arc::new(tx)), rx)
}

#[test]
fn test_agent_process_in_transaction() -> Result<()> {
    let mut m = Message::new();
    let a = Agent::default();
    m.transaction_id = TransactionId([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    let (h, mut rx) = handler_pair();
    a.start(m.transaction_id, Instant::now(), h)?;
    a.process(m)?;
    a.close()?;

    let e = rx.try_recv().expect("no event");
    let msg = e.result.expect("got error");
    let tid = TransactionId([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    assert_eq!(
        msg.transaction_id, tid,
        "{} (got) != {} (expected)",
        msg.transaction_id, tid
    );
    assert!(rx.try_recv().is_err(), "handler must fire exactly once");
    Ok(())
}

#[test]
fn test_agent_process_unmatched() -> Result<()> {
    // Messages without a registration go to the default handler.
    let (h, mut rx) = handler_pair();
    let a = Agent::new(h);
    let mut m = Message::new();
    m.transaction_id = TransactionId([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    a.process(m.clone())?;
    a.close()?;

    let e = rx.try_recv().expect("no event");
    assert!(e.result.is_ok(), "got error: {:?}", e.result);

    let result = a.process(m);
    if let Err(err) = result {
        assert_eq!(
            err,
            Error::ErrAgentClosed,
            "closed agent should return <{}>, but got <{}>",
            Error::ErrAgentClosed,
            err,
        );
    } else {
        panic!("expected error, but got ok");
    }
    Ok(())
}

#[test]
fn test_agent_start() -> Result<()> {
    let a = Agent::default();
    let id = TransactionId::new();
    let deadline = Instant::now().add(Duration::from_secs(3600));
    a.start(id, deadline, noop_handler())?;

    let result = a.start(id, deadline, noop_handler());
    if let Err(err) = result {
        assert_eq!(
            err,
            Error::ErrTransactionExists,
            "duplicate start should return <{}>, got <{}>",
            Error::ErrTransactionExists,
            err,
        );
    } else {
        panic!("expected error, but got ok");
    }
    a.close()?;

    let id = TransactionId::new();
    let result = a.start(id, deadline, noop_handler());
    if let Err(err) = result {
        assert_eq!(
            err,
            Error::ErrAgentClosed,
            "start on closed agent should return <{}>, got <{}>",
            Error::ErrAgentClosed,
            err,
        );
    } else {
        panic!("expected error, but got ok");
    }
    Ok(())
}

#[test]
fn test_agent_stop() -> Result<()> {
    let a = Agent::default();

    let result = a.stop(TransactionId([0u8; TRANSACTION_ID_SIZE]));
    if let Err(err) = result {
        assert_eq!(
            err,
            Error::ErrTransactionNotExists,
            "unexpected error: {}, should be {}",
            Error::ErrTransactionNotExists,
            err,
        );
    } else {
        panic!("expected error, but got ok");
    }

    let id = TransactionId::new();
    let deadline = Instant::now().add(Duration::from_millis(200));
    let (h, mut rx) = handler_pair();
    a.start(id, deadline, h)?;
    a.stop(id)?;

    if let Err(err) = rx.try_recv().expect("no event").result {
        assert_eq!(
            err,
            Error::ErrTransactionStopped,
            "unexpected error: {}, should be {}",
            err,
            Error::ErrTransactionStopped
        );
    } else {
        panic!("expected error, got ok");
    }

    a.close()?;

    let result = a.close();
    if let Err(err) = result {
        assert_eq!(
            err,
            Error::ErrAgentClosed,
            "second close returned {} instead of {}",
            err,
            Error::ErrAgentClosed,
        );
    } else {
        panic!("expected error, but got ok");
    }

    let result = a.stop(TransactionId([0u8; TRANSACTION_ID_SIZE]));
    if let Err(err) = result {
        assert_eq!(
            err,
            Error::ErrAgentClosed,
            "unexpected error: {}, should be {}",
            Error::ErrAgentClosed,
            err,
        );
    } else {
        panic!("expected error, but got ok");
    }
    Ok(())
}

#[test]
fn test_agent_gc() -> Result<()> {
    let a = Agent::default();
    let deadline = Instant::now();
    let gc_deadline = deadline.add(Duration::from_secs(1));
    let deadline_not_gc = gc_deadline.add(Duration::from_secs(24 * 3600));

    let mut should_time_out = Vec::new();
    for _ in 0..5 {
        let (h, rx) = handler_pair();
        a.start(TransactionId::new(), deadline, h)?;
        should_time_out.push(rx);
    }
    let mut should_not_time_out = Vec::new();
    for _ in 0..5 {
        let (h, rx) = handler_pair();
        a.start(TransactionId::new(), deadline_not_gc, h)?;
        should_not_time_out.push(rx);
    }

    a.collect(gc_deadline)?;

    for rx in &mut should_time_out {
        let e = rx.try_recv().expect("should time out");
        assert_eq!(e.result.unwrap_err(), Error::ErrTransactionTimeOut);
    }
    for rx in &mut should_not_time_out {
        assert!(rx.try_recv().is_err(), "should not time out");
    }

    a.close()?;
    // Collect on a closed agent reports the close.
    assert_eq!(a.collect(gc_deadline), Err(Error::ErrAgentClosed));
    Ok(())
}

#[test]
fn test_agent_collect_deadline_inclusive() -> Result<()> {
    // A registration expiring exactly at the collect time fires.
    let a = Agent::default();
    let deadline = Instant::now();
    let (h, mut rx) = handler_pair();
    a.start(TransactionId::new(), deadline, h)?;
    a.collect(deadline)?;
    let e = rx.try_recv().expect("no event");
    assert_eq!(e.result.unwrap_err(), Error::ErrTransactionTimeOut);
    a.close()?;
    Ok(())
}

#[test]
fn test_agent_close_drains() -> Result<()> {
    let a = Agent::default();
    let deadline = Instant::now().add(Duration::from_secs(3600));
    let mut receivers = Vec::new();
    for _ in 0..3 {
        let (h, rx) = handler_pair();
        a.start(TransactionId::new(), deadline, h)?;
        receivers.push(rx);
    }
    a.close()?;
    for rx in &mut receivers {
        let e = rx.try_recv().expect("no event");
        assert_eq!(e.result.unwrap_err(), Error::ErrAgentClosed);
        assert!(rx.try_recv().is_err(), "handler must fire exactly once");
    }
    Ok(())
}

#[test]
fn test_agent_single_fire() -> Result<()> {
    // A stopped transaction does not fire again on collect, and does
    // not affect other registrations.
    let a = Agent::default();
    let deadline = Instant::now();
    let (h_i, mut rx_i) = handler_pair();
    let (h_j, mut rx_j) = handler_pair();
    let i = TransactionId::new();
    let j = TransactionId::new();
    a.start(i, deadline, h_i)?;
    a.start(j, deadline.add(Duration::from_secs(3600)), h_j)?;

    a.stop(i)?;
    a.collect(deadline.add(Duration::from_secs(1)))?;

    let e = rx_i.try_recv().expect("no event for i");
    assert_eq!(e.id, i);
    assert_eq!(e.result.unwrap_err(), Error::ErrTransactionStopped);
    assert!(rx_i.try_recv().is_err(), "i fired more than once");
    assert!(rx_j.try_recv().is_err(), "j must be unaffected");

    a.close()?;
    let e = rx_j.try_recv().expect("no event for j");
    assert_eq!(e.result.unwrap_err(), Error::ErrAgentClosed);
    Ok(())
}

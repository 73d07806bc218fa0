//! Shutdown handshake specs
//!
//! The source drains every registered worker before telling the sink it has
//! exited, and the sink keeps collecting until the source is gone and every
//! worker has left.

use crate::prelude::*;

#[test]
fn source_close_waits_for_last_worker_to_exit() {
    let Pipeline {
        mut source,
        mut sink,
        config,
    } = Pipeline::<u8, u8>::bind();

    let sink = thread::spawn(move || (&mut sink).collect::<Result<Vec<u8>, _>>());
    let source = thread::spawn(move || {
        source.send(1).unwrap();
        source.close().unwrap();
    });

    let mut worker = Worker::<u8, u8>::join(&config).unwrap();
    assert_eq!(worker.next_task().unwrap(), Some(1));
    worker.send(2).unwrap();
    assert_eq!(worker.next_task().unwrap(), None);

    // Told there are no more jobs, but still registered
    thread::sleep(Duration::from_millis(200));
    assert!(!source.is_finished());

    worker.close().unwrap();
    source.join().unwrap();
    similar_asserts::assert_eq!(sink.join().unwrap().unwrap(), vec![2]);
}

#[test]
fn sink_collects_results_arriving_after_source_exit() {
    let Pipeline {
        mut source,
        mut sink,
        config,
    } = Pipeline::<u32, u32>::bind();

    let sink = thread::spawn(move || {
        let results = (&mut sink).collect::<Result<Vec<u32>, _>>();
        (results, sink.source_closed())
    });
    let source = thread::spawn(move || {
        source.send(7).unwrap();
        source.close().unwrap();
    });

    // A hand-driven worker that leaves the source before finishing with the sink
    let mut to_source = ReqSocket::connect(&config.source, RETRY).unwrap();
    let mut to_sink = ReqSocket::connect(&config.sink, RETRY).unwrap();

    assert_eq!(request(&mut to_source, &Message::WorkerJoin), Message::Ack);
    assert_eq!(request(&mut to_sink, &Message::WorkerJoin), Message::Ack);
    assert_eq!(request(&mut to_source, &Message::Ack), Message::Task(json!(7)));
    assert_eq!(request(&mut to_source, &Message::Ack), Message::NoMoreJobs);
    assert_eq!(request(&mut to_source, &Message::WorkerExited), Message::Ack);

    // The source has now notified the sink and finished
    source.join().unwrap();

    assert_eq!(request(&mut to_sink, &Message::Result(json!(49))), Message::Ack);
    assert_eq!(request(&mut to_sink, &Message::WorkerExited), Message::Ack);

    let (results, source_closed) = sink.join().unwrap();
    similar_asserts::assert_eq!(results.unwrap(), vec![49]);
    assert!(source_closed);
}

#[test]
fn worker_leaving_early_does_not_stall_the_drain() {
    let Pipeline {
        mut source,
        mut sink,
        config,
    } = Pipeline::<u32, u32>::bind();

    let sink = thread::spawn(move || (&mut sink).collect::<Result<Vec<u32>, _>>());
    let source = thread::spawn(move || {
        for n in 0..5 {
            source.send(n).unwrap();
        }
        source.close().unwrap();
        source.workers()
    });

    let mut quitter = Worker::<u32, u32>::join(&config).unwrap();
    let steady = Worker::<u32, u32>::join(&config).unwrap();

    let quitter = thread::spawn(move || {
        // Takes at most one task, then leaves without waiting for the drain
        if let Some(n) = quitter.next_task().unwrap() {
            quitter.send(n).unwrap();
        }
        quitter.close().unwrap();
    });
    let steady = thread::spawn(move || work_until_done(steady, |n| n).unwrap());

    quitter.join().unwrap();
    steady.join().unwrap();
    assert_eq!(source.join().unwrap(), 0);

    let mut results = sink.join().unwrap().unwrap();
    results.sort_unstable();
    similar_asserts::assert_eq!(results, vec![0, 1, 2, 3, 4]);
}

#[test]
fn closing_a_worker_twice_deregisters_once() {
    let Pipeline {
        mut source,
        mut sink,
        config,
    } = Pipeline::<u8, u8>::bind();

    let sink = thread::spawn(move || {
        let results = (&mut sink).collect::<Result<Vec<u8>, _>>();
        (results, sink.workers())
    });
    let source = thread::spawn(move || {
        source.send(0).unwrap();
        source.close().unwrap();
        source.workers()
    });

    let mut worker = Worker::<u8, u8>::join(&config).unwrap();
    while let Some(n) = worker.next_task().unwrap() {
        worker.send(n).unwrap();
    }
    worker.close().unwrap();
    worker.close().unwrap();
    drop(worker);

    assert_eq!(source.join().unwrap(), 0);
    let (results, workers) = sink.join().unwrap();
    similar_asserts::assert_eq!(results.unwrap(), vec![0]);
    assert_eq!(workers, 0);
}

#[test]
fn teardown_without_grace_never_loses_the_last_ack() {
    for round in 0..50u8 {
        let Pipeline {
            mut source,
            mut sink,
            config,
        } = Pipeline::<u8, u8>::bind();

        let sink = thread::spawn(move || {
            let results = (&mut sink).collect::<Result<Vec<u8>, _>>();
            sink.close();
            results
        });
        let source = thread::spawn(move || {
            source.send(round)?;
            source.close()
        });

        let mut worker = Worker::<u8, u8>::join(&config).unwrap();
        let task = worker.next_task().unwrap().unwrap();
        worker.send(task).unwrap();
        assert_eq!(worker.next_task().unwrap(), None);

        let worker_closed = worker.close();
        assert!(worker_closed.is_ok(), "round {}: {:?}", round, worker_closed);
        let source_closed = source.join().unwrap();
        assert!(source_closed.is_ok(), "round {}: {:?}", round, source_closed);
        similar_asserts::assert_eq!(sink.join().unwrap().unwrap(), vec![round]);
    }
}

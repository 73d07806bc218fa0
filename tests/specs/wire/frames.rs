//! Wire format specs
//!
//! Each frame body is one JSON object tagged by `"type"`, with task and
//! result payloads under `"payload"`.

use crate::prelude::*;

fn body(frame: &[u8]) -> Value {
    serde_json::from_slice(frame).unwrap()
}

#[test]
fn worker_frames_as_seen_by_its_peers() {
    let mut fake_source = RepSocket::bind(&Endpoint::any_local_port()).unwrap();
    let mut fake_sink = RepSocket::bind(&Endpoint::any_local_port()).unwrap();
    let config = config(fake_source.endpoint().clone(), fake_sink.endpoint().clone());

    let ack = serde_json::to_vec(&json!({"type": "ack"})).unwrap();
    let replies = vec![
        ack.clone(),
        serde_json::to_vec(&json!({"type": "task", "payload": {"url": "u"}})).unwrap(),
        serde_json::to_vec(&json!({"type": "no_more_jobs"})).unwrap(),
        ack.clone(),
    ];
    let source = thread::spawn(move || {
        replies
            .into_iter()
            .map(|reply| {
                let frame = fake_source.recv().unwrap();
                fake_source.send(reply).unwrap();
                body(&frame)
            })
            .collect::<Vec<_>>()
    });
    let sink = thread::spawn(move || {
        (0..3)
            .map(|_| {
                let frame = fake_sink.recv().unwrap();
                fake_sink.send(ack.clone()).unwrap();
                body(&frame)
            })
            .collect::<Vec<_>>()
    });

    let mut worker = Worker::<Value, Value>::join(&config).unwrap();
    let task = worker.next_task().unwrap().unwrap();
    worker.send(json!({"fetched": task["url"]})).unwrap();
    assert_eq!(worker.next_task().unwrap(), None);
    worker.close().unwrap();

    similar_asserts::assert_eq!(
        source.join().unwrap(),
        vec![
            json!({"type": "worker_join"}),
            json!({"type": "ack"}),
            json!({"type": "ack"}),
            json!({"type": "worker_exited"}),
        ]
    );
    similar_asserts::assert_eq!(
        sink.join().unwrap(),
        vec![
            json!({"type": "worker_join"}),
            json!({"type": "result", "payload": {"fetched": "u"}}),
            json!({"type": "worker_exited"}),
        ]
    );
}

#[test]
fn source_frames_as_seen_by_a_worker_and_the_sink() {
    let mut fake_sink = RepSocket::bind(&Endpoint::any_local_port()).unwrap();
    let mut source = Source::<Vec<u8>>::bind(&config(
        Endpoint::any_local_port(),
        fake_sink.endpoint().clone(),
    ))
    .unwrap();
    let endpoint = source.endpoint().clone();

    let worker = thread::spawn(move || {
        let mut req = ReqSocket::connect(&endpoint, RETRY).unwrap();
        let mut exchange = |msg: Value| {
            let frame = serde_json::to_vec(&msg).unwrap();
            body(&req.request(&frame).unwrap())
        };
        vec![
            exchange(json!({"type": "worker_join"})),
            exchange(json!({"type": "ack"})),
            exchange(json!({"type": "ack"})),
            exchange(json!({"type": "worker_exited"})),
        ]
    });
    let sink = thread::spawn(move || {
        let frame = fake_sink.recv().unwrap();
        fake_sink
            .send(serde_json::to_vec(&json!({"type": "ack"})).unwrap())
            .unwrap();
        body(&frame)
    });

    source.send(vec![1, 2, 3]).unwrap();
    source.close().unwrap();

    similar_asserts::assert_eq!(
        worker.join().unwrap(),
        vec![
            json!({"type": "ack"}),
            json!({"type": "task", "payload": [1, 2, 3]}),
            json!({"type": "no_more_jobs"}),
            json!({"type": "ack"}),
        ]
    );
    similar_asserts::assert_eq!(sink.join().unwrap(), json!({"type": "source_exited"}));
}

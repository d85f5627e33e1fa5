use std::thread;
use std::time::Duration;

use blogdb::{Engine, Error, NewPost, PostChanges, SessionStats, StorageConfig};

fn open_engine(dir: &tempfile::TempDir) -> Engine {
    Engine::open(StorageConfig::new(dir.path().join("blog.db"))).unwrap()
}

/// Short busy timeout so lock contention fails fast instead of hanging
fn open_impatient_engine(dir: &tempfile::TempDir) -> Engine {
    let config = StorageConfig::new(dir.path().join("blog.db")).with_busy_timeout(Duration::from_millis(200));
    Engine::open(config).unwrap()
}

fn seed_post(engine: &Engine) -> i64 {
    engine
        .with_session(|s| {
            let post = s.create(&NewPost::new("Hello", "World"))?;
            s.commit()?;
            Ok::<_, Error>(post.id)
        })
        .unwrap()
}

#[test]
fn create_then_update_title() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(&dir);

    let created = engine
        .with_session(|s| {
            let post = s.create(&NewPost::new("Hello", "World"))?;
            s.commit()?;
            Ok::<_, Error>(post)
        })
        .unwrap();
    assert_eq!(created.title, "Hello");
    assert_eq!(created.content, "World");
    assert_eq!(created.created_at, created.updated_at);

    thread::sleep(Duration::from_millis(10));

    let updated = engine
        .with_session(|s| {
            let post = s.update(created.id, &PostChanges::default().title("Hello2"))?;
            s.commit()?;
            Ok::<_, Error>(post)
        })
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Hello2");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    let reread = engine.with_session(|s| s.get(created.id)).unwrap();
    assert_eq!(reread, Some(updated));
}

#[test]
fn rows_survive_reopening_the_engine() {
    let dir = tempfile::tempdir().unwrap();

    let id = {
        let engine = open_engine(&dir);
        engine
            .with_session(|s| {
                let post = s.create(&NewPost::new("kept", "across restarts"))?;
                s.commit()?;
                Ok::<_, Error>(post.id)
            })
            .unwrap()
    };

    let engine = open_engine(&dir);
    let post = engine.with_session(|s| s.get(id)).unwrap().unwrap();
    assert_eq!(post.title, "kept");
}

#[test]
fn failed_create_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(&dir);

    let result = engine.with_session(|s| {
        s.create(&NewPost { title: None, content: Some("orphan".into()) })?;
        s.commit()
    });
    assert!(matches!(result, Err(Error::ConstraintViolation(_))));

    assert_eq!(engine.with_session(|s| s.count()).unwrap(), 0);
}

#[test]
fn session_released_once_when_scope_errors() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(&dir);

    let result: Result<(), Error> = engine.with_session(|s| {
        s.create(&NewPost::new("doomed", "rolled back"))?;
        Err(Error::SessionClosed)
    });
    assert!(result.is_err());

    assert_eq!(engine.session_stats(), SessionStats { opened: 1, released: 1 });
    assert_eq!(engine.with_session(|s| s.count()).unwrap(), 0);
    assert_eq!(engine.session_stats().open(), 0);
}

#[test]
fn session_released_once_when_scope_panics() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(&dir);

    let worker = engine.clone();
    let outcome = thread::spawn(move || {
        let session = worker.session().unwrap();
        session.create(&NewPost::new("half", "written")).unwrap();
        panic!("handler failed");
    })
    .join();
    assert!(outcome.is_err());

    assert_eq!(engine.session_stats(), SessionStats { opened: 1, released: 1 });
    assert_eq!(engine.with_session(|s| s.count()).unwrap(), 0);
}

#[test]
fn concurrent_sessions_each_get_their_own_connection() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(&dir);

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let engine = engine.clone();
            thread::spawn(move || {
                for n in 0..5 {
                    engine
                        .with_session(|s| {
                            s.create(&NewPost::new(format!("w{worker}-{n}"), "body"))?;
                            s.commit()
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let posts = engine.with_session(|s| s.list()).unwrap();
    assert_eq!(posts.len(), 20);
    assert!(posts.windows(2).all(|w| w[0].id < w[1].id));
    assert!(posts.iter().all(|p| p.created_at <= p.updated_at));

    let stats = engine.session_stats();
    assert_eq!(stats.opened, stats.released);
}

#[test]
fn deleted_post_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(&dir);

    let id = engine
        .with_session(|s| {
            let post = s.create(&NewPost::new("short", "lived"))?;
            s.commit()?;
            Ok::<_, Error>(post.id)
        })
        .unwrap();

    let removed = engine
        .with_session(|s| {
            let removed = s.delete(id)?;
            s.commit()?;
            Ok::<_, Error>(removed)
        })
        .unwrap();
    assert!(removed);

    assert_eq!(engine.with_session(|s| s.get(id)).unwrap(), None);
}

#[test]
fn idle_reader_does_not_block_writer() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_impatient_engine(&dir);
    let id = seed_post(&engine);

    let reader = engine.session().unwrap();
    assert!(reader.get(id).unwrap().is_some());
    assert!(!reader.in_transaction());

    let writer = engine.session().unwrap();
    writer.update(id, &PostChanges::default().title("Hello2")).unwrap();
    writer.commit().unwrap();

    assert_eq!(reader.get(id).unwrap().unwrap().title, "Hello2");
}

#[test]
fn two_sessions_read_then_update_same_post() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_impatient_engine(&dir);
    let id = seed_post(&engine);

    let a = engine.session().unwrap();
    let b = engine.session().unwrap();
    let seen_by_a = a.get(id).unwrap().unwrap();
    let seen_by_b = b.get(id).unwrap().unwrap();
    assert_eq!(seen_by_a, seen_by_b);

    a.update(id, &PostChanges::default().title("from a")).unwrap();
    a.commit().unwrap();

    let updated = b.update(id, &PostChanges::default().content("from b")).unwrap().unwrap();
    b.commit().unwrap();

    assert_eq!(updated.title, "from a");
    assert_eq!(updated.content, "from b");
    assert_eq!(updated.created_at, seen_by_a.created_at);
}

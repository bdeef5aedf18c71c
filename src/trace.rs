//! Chrome trace output, enabled with `-d trace`.
//! Load the resulting trace.json in chrome://tracing or ui.perfetto.dev.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

thread_local! {
    static TRACE: RefCell<Option<Trace>> = RefCell::new(None);
}

enum EventType {
    Complete(Instant),
    Instant,
}

struct Event<'a> {
    name: &'a str,
    timestamp: Instant,
    event_type: EventType,
}

struct Trace {
    start: Instant,
    w: BufWriter<File>,
}

impl Trace {
    fn new(path: &str) -> std::io::Result<Self> {
        let mut w = BufWriter::new(File::create(path)?);
        writeln!(w, "[")?;
        Ok(Trace {
            start: Instant::now(),
            w,
        })
    }

    fn write_event(&mut self, event: Event) -> std::io::Result<()> {
        write!(
            self.w,
            "{{ \"pid\": 0, \"name\": {:?}, \"ts\": {}, ",
            event.name,
            event.timestamp.duration_since(self.start).as_micros(),
        )?;
        match event.event_type {
            EventType::Complete(end) => write!(
                self.w,
                "\"ph\": \"X\", \"dur\": {} }}",
                end.duration_since(event.timestamp).as_micros()
            ),
            EventType::Instant => write!(self.w, "\"ph\": \"i\", \"s\": \"g\" }}"),
        }
    }

    fn write(&mut self, event: Event) -> std::io::Result<()> {
        self.write_event(event)?;
        writeln!(self.w, ",")
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.write_event(Event {
            name: "main",
            timestamp: self.start,
            event_type: EventType::Complete(Instant::now()),
        })?;
        writeln!(self.w, "]")?;
        self.w.flush()
    }
}

pub fn open(path: &str) -> std::io::Result<()> {
    let trace = Trace::new(path)?;
    TRACE.with(|t| *t.borrow_mut() = Some(trace));
    Ok(())
}

fn enabled() -> bool {
    TRACE.with(|t| t.borrow().is_some())
}

fn record(event: Event) {
    TRACE.with(|t| {
        let mut slot = t.borrow_mut();
        let failed = match slot.as_mut() {
            Some(trace) => trace.write(event).is_err(),
            None => false,
        };
        // A trace that fails to write is dropped rather than failing the build.
        if failed {
            *slot = None;
        }
    });
}

/// Run f, recording how long it took under the given name.
#[inline]
pub fn scope<T>(name: &'static str, f: impl FnOnce() -> T) -> T {
    if !enabled() {
        return f();
    }
    let start = Instant::now();
    let result = f();
    record(Event {
        name,
        timestamp: start,
        event_type: EventType::Complete(Instant::now()),
    });
    result
}

/// Mark a point in time, e.g. an error noticed during a pass.
pub fn instant(name: &str) {
    if !enabled() {
        return;
    }
    record(Event {
        name,
        timestamp: Instant::now(),
        event_type: EventType::Instant,
    });
}

pub fn close() -> std::io::Result<()> {
    match TRACE.with(|t| t.borrow_mut().take()) {
        Some(mut trace) => trace.close(),
        None => Ok(()),
    }
}

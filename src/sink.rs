//! Destinations for emitted matches.
use std::collections::HashSet;
use std::io::{self, Write};

/// Receives matched paths one line at a time.
pub trait LineConsumer {
    fn receive(&mut self, line: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<F> LineConsumer for F
where
    F: FnMut(&str) -> io::Result<()>,
{
    fn receive(&mut self, line: &str) -> io::Result<()> {
        self(line)
    }
}

/// Writes each line followed by `\n`, e.g. to a buffered stdout.
pub struct WriterConsumer<W: Write> {
    out: W,
}

impl<W: Write> WriterConsumer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> LineConsumer for WriterConsumer<W> {
    fn receive(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

enum Target<'a> {
    Collecting(Vec<String>),
    Streaming(Box<dyn LineConsumer + 'a>),
}

/// The single output of a traversal: either an ordered in-memory list or a
/// consumer fed as matches are found.
pub struct Sink<'a> {
    target: Target<'a>,
    delivered: Option<HashSet<String>>,
    count: usize,
}

impl<'a> Sink<'a> {
    pub fn collecting() -> Self {
        Self::with_target(Target::Collecting(Vec::new()))
    }

    pub fn streaming(consumer: impl LineConsumer + 'a) -> Self {
        Self::with_target(Target::Streaming(Box::new(consumer)))
    }

    fn with_target(target: Target<'a>) -> Self {
        Self {
            target,
            delivered: None,
            count: 0,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.target, Target::Streaming(_))
    }

    /// Remember every line delivered from now on and refuse to deliver the
    /// same line twice. Used around a delegated run so a fallback walk into
    /// the same sink only adds what is missing. Memory grows with the number
    /// of lines delivered until [`Sink::stop_tracking`].
    pub fn track_delivered(&mut self) {
        if self.delivered.is_none() {
            self.delivered = Some(HashSet::new());
        }
    }

    /// Forget the delivered lines and deliver repeats again.
    pub fn stop_tracking(&mut self) {
        self.delivered = None;
    }

    /// Deliver `path`. Returns `false` when it was suppressed as a repeat.
    pub fn receive(&mut self, path: &str) -> io::Result<bool> {
        if let Some(seen) = self.delivered.as_mut() {
            if !seen.insert(path.to_owned()) {
                return Ok(false);
            }
        }

        match &mut self.target {
            Target::Collecting(paths) => paths.push(path.to_owned()),
            Target::Streaming(consumer) => consumer.receive(path)?,
        }
        self.count += 1;
        Ok(true)
    }

    /// Number of lines actually delivered.
    pub fn delivered(&self) -> usize {
        self.count
    }

    pub fn finish(&mut self) -> io::Result<()> {
        match &mut self.target {
            Target::Collecting(_) => Ok(()),
            Target::Streaming(consumer) => consumer.flush(),
        }
    }

    /// Collected paths in discovery order; empty for a streaming sink.
    pub fn into_results(self) -> Vec<String> {
        match self.target {
            Target::Collecting(paths) => paths,
            Target::Streaming(_) => Vec::new(),
        }
    }
}

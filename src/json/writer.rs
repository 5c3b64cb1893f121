use std::io::Write;

use log::{debug, error};
use serde_json::ser::Formatter;

use crate::document::{Container, DocValue, StructuredOutput, Token};
use crate::error::{OutputError, Result};
use crate::output::BackendError;

#[derive(Debug)]
struct Frame {
    container: Container,
    /// No member written yet, so no separator is due.
    first: bool,
    /// A key has been emitted and its value has not.
    awaiting_value: bool,
}

impl Frame {
    fn new(container: Container) -> Self {
        Self {
            container,
            first: true,
            awaiting_value: false,
        }
    }
}

/// JSON document writer over a `serde_json` formatter.
///
/// The formatter decides layout (compact or pretty); this type keeps the
/// container stack and checks that keys and values arrive where they may.
/// Dropping an unclosed writer closes the document.
pub struct JsonWriter<W: Write, F: Formatter> {
    /// Taken only by `into_inner`.
    writer: Option<W>,
    formatter: F,
    stack: Vec<Frame>,
    closed: bool,
}

impl<W: Write, F: Formatter> JsonWriter<W, F> {
    /// Start a document; the root object is opened immediately.
    pub fn new(mut writer: W, mut formatter: F) -> Result<Self> {
        formatter.begin_object(&mut writer)?;
        Ok(Self {
            writer: Some(writer),
            formatter,
            stack: vec![Frame::new(Container::Object)],
            closed: false,
        })
    }

    /// Close the document if still open and give back the byte sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.close()?;
        self.writer
            .take()
            .ok_or_else(|| OutputError::invalid_state("document has no sink"))
    }

    /// Current nesting depth, root included. Zero once closed.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn top(&mut self) -> Result<&mut Frame> {
        if self.closed {
            return Err(OutputError::invalid_state("document is closed"));
        }
        self.stack
            .last_mut()
            .ok_or_else(|| OutputError::invalid_state("document is closed"))
    }

    fn parts(&mut self) -> Result<(&mut W, &mut F)> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| OutputError::invalid_state("document has no sink"))?;
        Ok((writer, &mut self.formatter))
    }

    fn emit_key(&mut self, name: &str) -> Result<()> {
        let frame = self.top()?;
        match frame.container {
            Container::Array => {
                return Err(OutputError::Nesting {
                    expected: Container::Object,
                    found: Some(Container::Array),
                })
            }
            Container::Object if frame.awaiting_value => {
                return Err(OutputError::invalid_state(format!(
                    "key '{}' follows a key with no value",
                    name
                )))
            }
            Container::Object => {}
        }
        let first = frame.first;
        frame.first = false;
        frame.awaiting_value = true;

        let (w, f) = self.parts()?;
        f.begin_object_key(&mut *w, first)?;
        serde_json::to_writer(&mut *w, name).map_err(BackendError::from)?;
        f.end_object_key(w)?;
        Ok(())
    }

    /// Separator and framing before a value (leaf or container) in the
    /// current context.
    fn begin_value(&mut self) -> Result<()> {
        let frame = self.top()?;
        let (container, first, awaiting_value) =
            (frame.container, frame.first, frame.awaiting_value);
        if container == Container::Object && !awaiting_value {
            return Err(OutputError::invalid_state(
                "a value inside an object needs a key",
            ));
        }
        frame.first = false;

        let (w, f) = self.parts()?;
        match container {
            Container::Array => f.begin_array_value(w, first)?,
            Container::Object => f.begin_object_value(w)?,
        }
        Ok(())
    }

    fn end_value(&mut self) -> Result<()> {
        let frame = self.top()?;
        let container = frame.container;
        frame.awaiting_value = false;
        let (w, f) = self.parts()?;
        match container {
            Container::Array => f.end_array_value(w)?,
            Container::Object => f.end_object_value(w)?,
        }
        Ok(())
    }

    fn emit_token(&mut self, token: Token<'_>) -> Result<()> {
        let (w, f) = self.parts()?;
        match token {
            Token::Str(s) => serde_json::to_writer(w, &*s).map_err(BackendError::from)?,
            Token::Bool(b) => f.write_bool(w, b)?,
            Token::U64(v) => f.write_u64(w, v)?,
            Token::I64(v) => f.write_i64(w, v)?,
        }
        Ok(())
    }

    fn begin_container(&mut self, name: Option<&str>, container: Container) -> Result<()> {
        let in_object = self.top()?.container == Container::Object;
        if in_object {
            if let Some(name) = name {
                self.emit_key(name)?;
            }
        }
        self.begin_value()?;
        let (w, f) = self.parts()?;
        match container {
            Container::Object => f.begin_object(w)?,
            Container::Array => f.begin_array(w)?,
        }
        self.stack.push(Frame::new(container));
        Ok(())
    }

    fn end_container(&mut self, container: Container) -> Result<()> {
        let (found, awaiting_value) = {
            let top = self.top()?;
            (top.container, top.awaiting_value)
        };
        if self.stack.len() == 1 {
            return Err(OutputError::Nesting {
                expected: container,
                found: None,
            });
        }
        if found != container {
            return Err(OutputError::Nesting {
                expected: container,
                found: Some(found),
            });
        }
        if awaiting_value {
            return Err(OutputError::invalid_state("object ends after a key with no value"));
        }

        self.stack.pop();
        let (w, f) = self.parts()?;
        match container {
            Container::Object => f.end_object(w)?,
            Container::Array => f.end_array(w)?,
        }
        self.end_value()
    }
}

impl<W: Write, F: Formatter> StructuredOutput for JsonWriter<W, F> {
    fn begin_element(&mut self, name: Option<&str>) -> Result<()> {
        self.begin_container(name, Container::Object)
    }

    fn end_element(&mut self) -> Result<()> {
        self.end_container(Container::Object)
    }

    fn begin_collection(&mut self, name: Option<&str>) -> Result<()> {
        self.begin_container(name, Container::Array)
    }

    fn end_collection(&mut self) -> Result<()> {
        self.end_container(Container::Array)
    }

    fn write_key(&mut self, name: &str) -> Result<()> {
        self.emit_key(name)
    }

    fn write(&mut self, value: DocValue<'_>) -> Result<()> {
        self.begin_value()?;
        self.emit_token(value.token())?;
        self.end_value()
    }

    fn write_named(&mut self, name: &str, value: DocValue<'_>) -> Result<()> {
        self.emit_key(name)?;
        self.write(value)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let (found, awaiting_value) = {
            let top = self.top()?;
            (top.container, top.awaiting_value)
        };
        if self.stack.len() > 1 {
            return Err(OutputError::Nesting {
                expected: Container::Object,
                found: Some(found),
            });
        }
        if awaiting_value {
            return Err(OutputError::invalid_state("document ends after a key with no value"));
        }

        let (w, f) = self.parts()?;
        f.end_object(&mut *w)?;
        w.flush()?;
        self.stack.pop();
        self.closed = true;
        debug!("json document closed");
        Ok(())
    }
}

impl<W: Write, F: Formatter> Drop for JsonWriter<W, F> {
    fn drop(&mut self) {
        if self.closed || self.writer.is_none() {
            return;
        }
        if let Err(e) = self.close() {
            error!("failed to close json document: {}", e);
        }
    }
}

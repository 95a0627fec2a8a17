use std::fmt;
use std::io::Cursor;

use bytes::Bytes;
use mime::Mime;

/// A file received as one part of a multipart request.
///
/// The part is read into memory once. Cloning an [`Upload`] shares that buffer, and every
/// [`Upload::reader`] starts again at the first byte, so one file spliced into several
/// variables can be consumed independently at each of them.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    name: String,
    filename: Option<String>,
    content_type: Option<Mime>,
    content: Bytes,
}

#[buildstructor::buildstructor]
impl Upload {
    #[builder(visibility = "pub")]
    fn new(
        name: String,
        filename: Option<String>,
        content_type: Option<Mime>,
        content: Bytes,
    ) -> Self {
        Self {
            name,
            filename,
            content_type,
            content,
        }
    }

    /// The name of the multipart field the file was sent in.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file name announced by the client, if any.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The whole content of the file.
    pub fn bytes(&self) -> &Bytes {
        &self.content
    }

    /// A fresh cursor over the content, usable with both `std::io::Read` and
    /// `tokio::io::AsyncRead`.
    pub fn reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.content.clone())
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("name", &self.name)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.content.len())
            .finish()
    }
}

use std::sync::Arc;

use crate::Error;
use crate::TypeFilter;
use crate::WalkOutput;
use crate::WalkRequest;
use crate::backend::FsBackend;
use crate::backend::NativeFs;
use crate::walker::Transform;
use crate::walker::walk;

/// Handle through which walks reach the filesystem.
///
/// The context owns the [`FsBackend`]; cloning it is cheap and clones can
/// walk concurrently from different threads.
#[derive(Debug)]
pub struct FsContext<B: FsBackend = NativeFs> {
    backend: Arc<B>,
}

impl<B: FsBackend> Clone for FsContext<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
        }
    }
}

impl Default for FsContext<NativeFs> {
    fn default() -> Self {
        Self::native()
    }
}

impl FsContext<NativeFs> {
    /// Context over the host filesystem.
    pub fn native() -> Self {
        Self::new(NativeFs)
    }
}

impl<B: FsBackend> FsContext<B> {
    /// Context over `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// The backend walks go through.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// List the entries under `paths`.
    ///
    /// Any scan or stat failure aborts the listing. `recurse = false` lists
    /// only the immediate children of each path.
    pub fn scan<S: AsRef<str>>(
        &self,
        paths: &[S],
        include_hidden: bool,
        type_filter: TypeFilter,
        recurse: bool,
    ) -> Result<Vec<String>, Error> {
        let request = scan_request(paths, include_hidden, type_filter, recurse);
        Ok(walk(&*self.backend, &request, |p: &str| p.to_owned())?.items)
    }

    /// Walk `request`, collecting `transform(path)` for every entry that
    /// passes its filters.
    pub fn walk_map<F: Transform>(
        &self,
        request: &WalkRequest,
        transform: F,
    ) -> Result<WalkOutput<F::Output>, Error> {
        walk(&*self.backend, request, transform)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<B: FsBackend + 'static> FsContext<B> {
    /// [`FsContext::scan`] on tokio's blocking pool.
    pub async fn scan_async<S: AsRef<str>>(
        &self,
        paths: &[S],
        include_hidden: bool,
        type_filter: TypeFilter,
        recurse: bool,
    ) -> Result<Vec<String>, Error> {
        let request = scan_request(paths, include_hidden, type_filter, recurse);
        Ok(self
            .walk_map_async(request, |p: &str| p.to_owned())
            .await?
            .items)
    }

    /// [`FsContext::walk_map`] on tokio's blocking pool.
    ///
    /// Must be awaited from within a tokio runtime.
    pub async fn walk_map_async<F>(
        &self,
        request: WalkRequest,
        transform: F,
    ) -> Result<WalkOutput<F::Output>, Error>
    where
        F: Transform + Send + 'static,
        F::Output: Send + 'static,
    {
        let backend = self.backend.clone();
        tokio::task::spawn_blocking(move || walk(&*backend, &request, transform))
            .await
            .map_err(|e| Error::Io {
                what: "join walk task".to_owned(),
                how: e.to_string(),
            })?
    }
}

fn scan_request<S: AsRef<str>>(
    paths: &[S],
    include_hidden: bool,
    type_filter: TypeFilter,
    recurse: bool,
) -> WalkRequest {
    WalkRequest::new(paths)
        .include_hidden(include_hidden)
        .type_filter(type_filter)
        .max_depth(if recurse { None } else { Some(0) })
}

/// [`FsContext::scan`] over the host filesystem.
pub fn scan<S: AsRef<str>>(
    paths: &[S],
    include_hidden: bool,
    type_filter: TypeFilter,
    recurse: bool,
) -> Result<Vec<String>, Error> {
    FsContext::native().scan(paths, include_hidden, type_filter, recurse)
}

/// [`FsContext::walk_map`] over the host filesystem.
pub fn walk_map<F: Transform>(
    request: &WalkRequest,
    transform: F,
) -> Result<WalkOutput<F::Output>, Error> {
    FsContext::native().walk_map(request, transform)
}

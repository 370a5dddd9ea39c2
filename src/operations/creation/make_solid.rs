use crate::error::{OperationError, Result};
use crate::operations::query::faces_are_closed;
use crate::topology::{ShellData, ShellId, SolidData, SolidId, TopologyStore};

/// Creates a solid from an outer shell and optional void shells.
pub struct MakeSolid {
    outer_shell: ShellId,
    inner_shells: Vec<ShellId>,
}

impl MakeSolid {
    /// Creates a new `MakeSolid` operation.
    #[must_use]
    pub fn new(outer_shell: ShellId, inner_shells: Vec<ShellId>) -> Self {
        Self {
            outer_shell,
            inner_shells,
        }
    }

    /// Executes the operation, creating the solid in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell is missing or not closed.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        for &shell in std::iter::once(&self.outer_shell).chain(&self.inner_shells) {
            let faces = store.shell(shell)?.faces.clone();
            if !faces_are_closed(store, &faces)? {
                return Err(OperationError::InvalidInput("solid shell is not closed".into()).into());
            }
            store.shell_mut(shell)?.is_closed = true;
        }
        Ok(store.add_solid(SolidData {
            outer_shell: self.outer_shell,
            inner_shells: self.inner_shells.clone(),
        }))
    }
}

/// Wraps a list of faces into a closed shell and a solid.
pub(crate) fn solid_from_faces(
    store: &mut TopologyStore,
    faces: Vec<crate::topology::FaceId>,
) -> SolidId {
    let shell = store.add_shell(ShellData {
        faces,
        is_closed: true,
    });
    store.add_solid(SolidData {
        outer_shell: shell,
        inner_shells: Vec::new(),
    })
}

use crate::operations::boolean::operation::Operation;

/// Side of the operation an argument belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Object,
    Tool,
}

impl Group {
    /// The other side.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Object => Self::Tool,
            Self::Tool => Self::Object,
        }
    }
}

/// Where a split face lies relative to the solids of the other group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceState {
    Out,
    In,
    /// Coincides with a face of the other group, both facing the same way.
    OnSame,
    /// Coincides with a face of the other group, facing away from it.
    OnOpposite,
}

/// Decision about whether to keep a split face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepDecision {
    Keep,
    KeepFlipped,
    Discard,
}

/// Decides the fate of a split face of `group` in state `state`.
///
/// Coinciding faces are decided once, on the face standing for the pair.
///
/// | Face     | State      | Fuse    | Cut          | Common  |
/// |----------|------------|---------|--------------|---------|
/// | object   | Out        | keep    | keep         | discard |
/// | object   | In         | discard | discard      | keep    |
/// | tool     | Out        | keep    | discard      | discard |
/// | tool     | In         | discard | keep (flip)  | keep    |
/// | object   | OnSame     | keep    | discard      | keep    |
/// | object   | OnOpposite | discard | keep         | discard |
/// | tool     | OnSame     | keep    | discard      | keep    |
/// | tool     | OnOpposite | discard | keep (flip)  | discard |
///
/// `CutReversed` must be turned into `Cut` with the groups swapped first;
/// `Section` keeps no faces.
#[allow(clippy::match_same_arms)]
#[must_use]
pub fn should_keep_face(group: Group, state: FaceState, operation: Operation) -> KeepDecision {
    match (group, state, operation) {
        (_, _, Operation::Section | Operation::CutReversed) => KeepDecision::Discard,

        (Group::Object, FaceState::Out, Operation::Fuse) => KeepDecision::Keep,
        (Group::Object, FaceState::Out, Operation::Cut) => KeepDecision::Keep,
        (Group::Object, FaceState::Out, Operation::Common) => KeepDecision::Discard,

        (Group::Object, FaceState::In, Operation::Fuse) => KeepDecision::Discard,
        (Group::Object, FaceState::In, Operation::Cut) => KeepDecision::Discard,
        (Group::Object, FaceState::In, Operation::Common) => KeepDecision::Keep,

        (Group::Tool, FaceState::Out, Operation::Fuse) => KeepDecision::Keep,
        (Group::Tool, FaceState::Out, Operation::Cut) => KeepDecision::Discard,
        (Group::Tool, FaceState::Out, Operation::Common) => KeepDecision::Discard,

        (Group::Tool, FaceState::In, Operation::Fuse) => KeepDecision::Discard,
        (Group::Tool, FaceState::In, Operation::Cut) => KeepDecision::KeepFlipped,
        (Group::Tool, FaceState::In, Operation::Common) => KeepDecision::Keep,

        (_, FaceState::OnSame, Operation::Fuse | Operation::Common) => KeepDecision::Keep,
        (_, FaceState::OnSame, Operation::Cut) => KeepDecision::Discard,

        (_, FaceState::OnOpposite, Operation::Fuse | Operation::Common) => KeepDecision::Discard,
        (Group::Object, FaceState::OnOpposite, Operation::Cut) => KeepDecision::Keep,
        (Group::Tool, FaceState::OnOpposite, Operation::Cut) => KeepDecision::KeepFlipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuse_keeps_outside_faces() {
        assert_eq!(
            should_keep_face(Group::Object, FaceState::Out, Operation::Fuse),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_face(Group::Tool, FaceState::Out, Operation::Fuse),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_face(Group::Tool, FaceState::In, Operation::Fuse),
            KeepDecision::Discard
        );
    }

    #[test]
    fn cut_flips_tool_faces_inside_the_object() {
        assert_eq!(
            should_keep_face(Group::Tool, FaceState::In, Operation::Cut),
            KeepDecision::KeepFlipped
        );
        assert_eq!(
            should_keep_face(Group::Tool, FaceState::Out, Operation::Cut),
            KeepDecision::Discard
        );
        assert_eq!(
            should_keep_face(Group::Object, FaceState::In, Operation::Cut),
            KeepDecision::Discard
        );
    }

    #[test]
    fn common_keeps_inside_faces() {
        assert_eq!(
            should_keep_face(Group::Object, FaceState::In, Operation::Common),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_face(Group::Tool, FaceState::In, Operation::Common),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_face(Group::Object, FaceState::Out, Operation::Common),
            KeepDecision::Discard
        );
    }

    #[test]
    fn coinciding_faces() {
        assert_eq!(
            should_keep_face(Group::Object, FaceState::OnSame, Operation::Fuse),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_face(Group::Object, FaceState::OnSame, Operation::Cut),
            KeepDecision::Discard
        );
        assert_eq!(
            should_keep_face(Group::Object, FaceState::OnOpposite, Operation::Cut),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_face(Group::Tool, FaceState::OnOpposite, Operation::Cut),
            KeepDecision::KeepFlipped
        );
        assert_eq!(
            should_keep_face(Group::Object, FaceState::OnOpposite, Operation::Common),
            KeepDecision::Discard
        );
    }

    #[test]
    fn section_keeps_no_faces() {
        assert_eq!(
            should_keep_face(Group::Object, FaceState::Out, Operation::Section),
            KeepDecision::Discard
        );
    }

    #[test]
    fn other_group() {
        assert_eq!(Group::Object.other(), Group::Tool);
        assert_eq!(Group::Tool.other(), Group::Object);
    }
}

use crate::error::ObserverError;
use crate::sentence::ReactiveSentence;

/// A view that re-renders whenever the sentence changes.
///
/// Called synchronously, in attach order, after every mutation has fully
/// settled. Returning an error stops the fan-out.
pub trait Observer {
    fn update(&self, sentence: &ReactiveSentence) -> Result<(), ObserverError>;
}

impl<F> Observer for F
where
    F: Fn(&ReactiveSentence) -> Result<(), ObserverError>,
{
    fn update(&self, sentence: &ReactiveSentence) -> Result<(), ObserverError> {
        self(sentence)
    }
}

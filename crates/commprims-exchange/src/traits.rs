/// Write side of a latest-value handoff: newer items replace older ones.
pub trait LatestSink<T> {
    fn push(&mut self, item: T);
}

/// Read side of a latest-value handoff.
///
/// `None` means nothing new since the previous successful pop; it is a
/// routine outcome, not an error.
pub trait LatestSource<T> {
    fn pop(&mut self) -> Option<T>;
}

impl<T, S: LatestSink<T> + ?Sized> LatestSink<T> for &mut S {
    fn push(&mut self, item: T) {
        (**self).push(item);
    }
}

impl<T, S: LatestSource<T> + ?Sized> LatestSource<T> for &mut S {
    fn pop(&mut self) -> Option<T> {
        (**self).pop()
    }
}

impl<T> LatestSink<T> for Vec<T> {
    fn push(&mut self, item: T) {
        Vec::push(self, item);
    }
}

use ringpipe::{Consumer, PipeError, Producer};
use std::thread::JoinHandle;

/// A built pipeline: a producer feeding the first stage and a consumer
/// reading the last.
///
/// The fields are deliberately public and independently movable, mirroring
/// the way the two ends have independent lifetimes: the usual shutdown is
/// to feed `input`, drop it, then drain `output` until it reports
/// end-of-stream.
pub struct Pipeline<I: Copy, O: Copy> {
    /// Producer for the first stage's pipe. Dropping it (and any clones)
    /// starts the shutdown cascade.
    pub input: Producer<I>,
    /// Consumer for the last stage's pipe; joins the stage workers when
    /// dropped.
    pub output: PipelineOutput<O>,
}

impl<I: Copy, O: Copy> Pipeline<I, O> {
    /// Splits the pipeline into its two ends, so the input can move to a
    /// feeding thread while something else drains the output.
    pub fn into_parts(self) -> (Producer<I>, PipelineOutput<O>) {
        (self.input, self.output)
    }
}

/// The read end of a pipeline, carrying the stage workers' join handles.
///
/// Dropping it releases the read side first (so any writer still pushing
/// into a bounded tail pipe unblocks) and then joins every stage worker.
/// The workers only exit once their inputs report end-of-stream, so
/// release every [`Pipeline::input`] producer (and its clones) before
/// dropping this, or the drop will wait forever.
pub struct PipelineOutput<O: Copy> {
    consumer: Option<Consumer<O>>,
    workers: Vec<JoinHandle<()>>,
}

impl<O: Copy> PipelineOutput<O> {
    pub(crate) fn new(consumer: Consumer<O>, workers: Vec<JoinHandle<()>>) -> Self {
        Self {
            consumer: Some(consumer),
            workers,
        }
    }

    fn consumer(&self) -> &Consumer<O> {
        // Safety: the Option is only emptied by drop.
        self.consumer.as_ref().unwrap()
    }

    /// Blocking pop from the last stage; 0 means the cascade has finished
    /// and every buffered element has been read.
    pub fn recv(&self, out: &mut [O]) -> usize {
        self.consumer().recv(out)
    }

    /// Like [`recv`](Self::recv), filling a cleared `Vec` with up to
    /// `max_n` elements.
    pub fn recv_into(&self, buf: &mut Vec<O>, max_n: usize) -> usize {
        self.consumer().recv_into(buf, max_n)
    }

    /// Non-blocking pop from the last stage.
    pub fn try_recv(&self, out: &mut [O]) -> Result<usize, PipeError> {
        self.consumer().try_recv(out)
    }
}

impl<O: Copy> Drop for PipelineOutput<O> {
    fn drop(&mut self) {
        // Release the read side before joining: residual writers into the
        // tail pipe must observe the sink to exit.
        drop(self.consumer.take());

        for worker in self.workers.drain(..) {
            // A worker that panicked in its transform has already released
            // its handles via unwinding; nothing left to clean up.
            let _ = worker.join();
        }
    }
}

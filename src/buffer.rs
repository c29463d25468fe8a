/// Contiguous free/used regions of a buffered-I/O container.
///
/// The socket layer reads into [`free_area`](IoBuffer::free_area) and then
/// calls [`mark_used`](IoBuffer::mark_used), or writes from
/// [`used_area`](IoBuffer::used_area) and then calls
/// [`mark_free`](IoBuffer::mark_free). It never allocates, resizes or
/// looks at the bytes.
pub trait IoBuffer {
	/// Space available for incoming bytes.
	fn free_area(&mut self) -> &mut [u8];

	/// Bytes waiting to be consumed.
	fn used_area(&self) -> &[u8];

	/// Moves `n` bytes from the free region to the used region.
	fn mark_used(&mut self, n: usize);

	/// Releases `n` consumed bytes from the used region.
	fn mark_free(&mut self, n: usize);

	/// Length of the free region.
	fn free_size(&self) -> usize;

	fn used_size(&self) -> usize {
		self.used_area().len()
	}
}

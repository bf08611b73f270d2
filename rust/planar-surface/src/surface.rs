//! The shaped, strided view type over shared element storage.

use std::sync::Arc;

use planar_common::{Result, error::Error};

use crate::buffer::Buffer;
use crate::iter::{Iter, IterMut};
use crate::overlap::{Extent, extents_overlap};

/// A shaped, strided 2D window over element storage.
///
/// A surface is `cols x rows` logical elements addressed row-major: element
/// `(row, col)` lives at `origin + stride * row + col`, where `stride` is
/// the element distance between successive row starts (`stride >= cols`,
/// with `stride - cols` unused padding elements per row). Storage is either
/// an owned, reference-counted [`Buffer`] shared with every view derived
/// from this surface, or external memory wrapped without ownership.
///
/// `Clone` is a cheap aliasing copy: the new handle shares the same storage
/// and sees the same elements. Deep copies are always explicit
/// ([`deep_clone`](Surface::deep_clone), [`copy_to`](Surface::copy_to)).
///
/// # Aliasing
///
/// Any number of surfaces may read and write the same buffer; there is no
/// internal mutual-exclusion discipline. The reference count itself is
/// atomic, but keeping concurrent or aliasing mutation coherent is the
/// caller's contract. [`is_overlapping`](Surface::is_overlapping) exists to
/// detect possible aliasing before correctness-sensitive operations.
pub struct Surface<T> {
    cols: usize,
    rows: usize,
    stride: usize,
    origin: *mut T,
    buffer: Option<Arc<Buffer<T>>>,
}

unsafe impl<T: Send + Sync> Send for Surface<T> {}

unsafe impl<T: Send + Sync> Sync for Surface<T> {}

impl<T> Surface<T> {
    /// Creates an empty surface with no storage.
    pub fn empty() -> Surface<T> {
        Surface {
            cols: 0,
            rows: 0,
            stride: 0,
            origin: std::ptr::null_mut(),
            buffer: None,
        }
    }

    /// Allocates a dense `width x height` surface of value-initialized
    /// elements, exclusively owning its buffer.
    pub fn new(width: usize, height: usize) -> Surface<T>
    where
        T: Clone + Default,
    {
        Self::with_stride(width, height, width)
    }

    /// Allocates a `width x height` surface whose rows start `stride`
    /// elements apart. A zero `stride` defaults to `width`.
    ///
    /// The backing buffer holds `stride * height` elements.
    ///
    /// # Panics
    ///
    /// Panics if a non-zero `stride` is smaller than `width`.
    pub fn with_stride(width: usize, height: usize, stride: usize) -> Surface<T>
    where
        T: Clone + Default,
    {
        let stride = if stride == 0 { width } else { stride };
        assert!(
            stride >= width,
            "stride {stride} is smaller than row width {width}"
        );
        let buffer = Arc::new(Buffer::allocate(stride * height));
        let origin = buffer.base_ptr();
        Surface {
            cols: width,
            rows: height,
            stride,
            origin,
            buffer: Some(buffer),
        }
    }

    /// Wraps external memory as a `width x height` surface without taking
    /// ownership. A zero `stride` defaults to `width`.
    ///
    /// The surface has no influence on the wrapped memory's lifetime, and
    /// [`create`](Surface::create) can never reuse it in place.
    ///
    /// # Safety
    ///
    /// `data` must be valid for reads and writes of every element address
    /// `stride * row + col` with `row < height` and `col < width`, for the
    /// whole lifetime of the returned surface and of every view derived
    /// from it. `stride` must be at least `width`.
    pub unsafe fn from_raw_parts(
        data: *mut T,
        width: usize,
        height: usize,
        stride: usize,
    ) -> Surface<T> {
        let stride = if stride == 0 { width } else { stride };
        Surface {
            cols: width,
            rows: height,
            stride,
            origin: data,
            buffer: None,
        }
    }

    /// Builds a dense owned surface by copying `height` rows of `width`
    /// elements out of `data`, reading row starts `stride` elements apart.
    /// A zero `stride` defaults to `width`.
    ///
    /// This is the copying counterpart of
    /// [`from_raw_parts`](Surface::from_raw_parts): the result owns a fresh
    /// buffer and `data` can be discarded afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `stride` is smaller than `width`, or if `data` is too short
    /// to supply every row.
    pub fn copy_from_slice(data: &[T], width: usize, height: usize, stride: usize) -> Surface<T>
    where
        T: Clone + Default,
    {
        let stride = if stride == 0 { width } else { stride };
        assert!(
            stride >= width,
            "stride {stride} is smaller than row width {width}"
        );
        let needed = if height == 0 {
            0
        } else {
            stride * (height - 1) + width
        };
        assert!(
            data.len() >= needed,
            "slice of {} elements cannot supply a {width}x{height} surface with stride {stride}",
            data.len()
        );
        let mut out = Surface::new(width, height);
        for y in 0..height {
            out.row_mut(y)
                .clone_from_slice(&data[y * stride..y * stride + width]);
        }
        out
    }

    /// Takes ownership of `vec` as the dense backing storage of a
    /// `width x height` surface.
    ///
    /// # Panics
    ///
    /// Panics if the vector length is not exactly `width * height`.
    pub fn from_vec(vec: Vec<T>, width: usize, height: usize) -> Surface<T> {
        assert_eq!(
            vec.len(),
            width * height,
            "vector length does not match a {width}x{height} surface"
        );
        let buffer = Arc::new(Buffer::from_vec(vec));
        let origin = buffer.base_ptr();
        Surface {
            cols: width,
            rows: height,
            stride: width,
            origin,
            buffer: Some(buffer),
        }
    }

    /// Logical width in elements.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Alias for [`cols`](Surface::cols).
    #[inline]
    pub fn width(&self) -> usize {
        self.cols
    }

    /// Logical height in rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Alias for [`rows`](Surface::rows).
    #[inline]
    pub fn height(&self) -> usize {
        self.rows
    }

    /// Element distance between successive row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of logical elements (`cols * rows`).
    #[inline]
    pub fn len(&self) -> usize {
        self.cols * self.rows
    }

    /// Returns `true` if the surface has no logical elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` iff `stride == cols`, i.e. the logical elements form
    /// one contiguous run with no inter-row padding. This is a layout fact
    /// recomputed from the current shape.
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.stride == self.cols
    }

    /// Address of element (0, 0); null for an empty surface.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.origin
    }

    /// Mutable address of element (0, 0); null for an empty surface.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.origin
    }

    /// Address of logical element `(row, col)`.
    ///
    /// Pure address arithmetic: no bound is validated and nothing is
    /// dereferenced. Out-of-range coordinates yield an address outside the
    /// surface; dereferencing such an address is undefined behavior.
    #[inline]
    pub fn ptr_at(&self, row: usize, col: usize) -> *const T {
        self.origin.wrapping_add(self.stride * row + col) as *const T
    }

    /// Mutable address of logical element `(row, col)`; see
    /// [`ptr_at`](Surface::ptr_at).
    #[inline]
    pub fn ptr_at_mut(&mut self, row: usize, col: usize) -> *mut T {
        self.origin.wrapping_add(self.stride * row + col)
    }

    /// Reference to element `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the logical extent.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> &T {
        assert!(
            row < self.rows && col < self.cols,
            "coordinate ({row}, {col}) out of bounds for a {}x{} surface",
            self.cols,
            self.rows
        );
        unsafe { &*self.origin.add(self.stride * row + col) }
    }

    /// Mutable reference to element `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the logical extent.
    #[inline]
    pub fn at_mut(&mut self, row: usize, col: usize) -> &mut T {
        assert!(
            row < self.rows && col < self.cols,
            "coordinate ({row}, {col}) out of bounds for a {}x{} surface",
            self.cols,
            self.rows
        );
        unsafe { &mut *self.origin.add(self.stride * row + col) }
    }

    /// Reference to element `(row, col)`, or `None` out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        (row < self.rows && col < self.cols)
            .then(|| unsafe { &*self.origin.add(self.stride * row + col) })
    }

    /// Mutable reference to element `(row, col)`, or `None` out of bounds.
    #[inline]
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        (row < self.rows && col < self.cols)
            .then(|| unsafe { &mut *self.origin.add(self.stride * row + col) })
    }

    /// Reference to element `(row, col)` with no bound check.
    ///
    /// # Safety
    ///
    /// `row < rows()` and `col < cols()` must hold.
    #[inline]
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> &T {
        unsafe { &*self.origin.add(self.stride * row + col) }
    }

    /// Mutable reference to element `(row, col)` with no bound check.
    ///
    /// # Safety
    ///
    /// `row < rows()` and `col < cols()` must hold.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, row: usize, col: usize) -> &mut T {
        unsafe { &mut *self.origin.add(self.stride * row + col) }
    }

    /// Row `y` as a slice of `cols` elements.
    ///
    /// # Panics
    ///
    /// Panics if `y >= rows()`.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.rows, "row {y} out of bounds for {} rows", self.rows);
        unsafe { std::slice::from_raw_parts(self.origin.add(self.stride * y), self.cols) }
    }

    /// Row `y` as a mutable slice of `cols` elements.
    ///
    /// # Panics
    ///
    /// Panics if `y >= rows()`.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.rows, "row {y} out of bounds for {} rows", self.rows);
        unsafe { std::slice::from_raw_parts_mut(self.origin.add(self.stride * y), self.cols) }
    }

    /// The logical contents as one contiguous slice, when
    /// [`is_contiguous`](Surface::is_contiguous) holds.
    pub fn as_slice(&self) -> Option<&[T]> {
        if !self.is_contiguous() {
            return None;
        }
        if self.is_empty() {
            return Some(&[]);
        }
        Some(unsafe { std::slice::from_raw_parts(self.origin, self.len()) })
    }

    /// The logical contents as one contiguous mutable slice, when
    /// [`is_contiguous`](Surface::is_contiguous) holds.
    pub fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        if !self.is_contiguous() {
            return None;
        }
        if self.is_empty() {
            return Some(&mut []);
        }
        Some(unsafe { std::slice::from_raw_parts_mut(self.origin, self.len()) })
    }

    /// Extracts the `width x height` sub-view whose top-left element is the
    /// parent's `(y, x)`.
    ///
    /// The view aliases this surface: it shares the same buffer reference
    /// (if any), keeps the parent's stride, and advances the origin by
    /// `stride * y + x`. No allocation or copy occurs; writes through the
    /// view are visible through the parent and vice versa.
    ///
    /// # Panics
    ///
    /// Panics if the region exceeds the parent's logical extent.
    pub fn view(&self, x: usize, y: usize, width: usize, height: usize) -> Surface<T> {
        assert!(
            x + width <= self.cols && y + height <= self.rows,
            "region ({x}, {y}) {width}x{height} exceeds the {}x{} surface extent",
            self.cols,
            self.rows
        );
        unsafe { self.view_unchecked(x, y, width, height) }
    }

    /// Fallible form of [`view`](Surface::view).
    pub fn try_view(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Surface<T>> {
        if x + width > self.cols || y + height > self.rows {
            return Err(Error::region_out_of_bounds(
                x, y, width, height, self.cols, self.rows,
            ));
        }
        Ok(unsafe { self.view_unchecked(x, y, width, height) })
    }

    /// Extracts a sub-view with no validation at all.
    ///
    /// # Safety
    ///
    /// Every element address `origin + stride * (y + r) + (x + c)` with
    /// `r < height`, `c < width` must lie inside the storage this surface
    /// points into. Unlike [`view`](Surface::view), the region may
    /// legitimately exceed the parent's *logical* extent as long as it
    /// stays within the physical allocation.
    pub unsafe fn view_unchecked(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Surface<T> {
        Surface {
            cols: width,
            rows: height,
            stride: self.stride,
            origin: self.origin.wrapping_add(self.stride * y + x),
            buffer: self.buffer.clone(),
        }
    }

    /// Whether the logical element ranges of the two surfaces could
    /// physically alias.
    ///
    /// Pure address arithmetic over `(origin, cols, rows, stride)`; the
    /// buffer references are not consulted, so wrapped external memory is
    /// compared exactly like owned storage. The answer is symmetric and
    /// conservative: `false` is authoritative, `true` means "possible".
    /// Empty and zero-stride surfaces never overlap anything.
    pub fn is_overlapping(&self, other: &Surface<T>) -> bool {
        extents_overlap(self.extent(), other.extent())
    }

    /// Immutable iterator over the logical elements in row-major order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Mutable iterator over the logical elements in row-major order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self)
    }
}

impl<T> Surface<T> {
    /// Reshapes this surface to a dense `width x height`, reusing storage
    /// when possible.
    ///
    /// Three cases, in order:
    ///
    /// 1. The current `(cols, rows)` already equal the request: no-op.
    ///    Stride and origin are left untouched, even when non-default.
    /// 2. This surface exclusively owns its buffer and the buffer holds at
    ///    least `width * height` elements: the storage is reinterpreted in
    ///    place: `stride` becomes `width` and the origin returns to the
    ///    buffer base. Any prior sub-view offset or padding stride is
    ///    discarded; existing element values are *not* rearranged. This is
    ///    reshape-to-dense, not a contents-preserving resize.
    /// 3. Otherwise the surface is replaced wholesale by a freshly
    ///    allocated dense surface; the old buffer reference is released.
    ///
    /// Surfaces created with [`from_raw_parts`](Surface::from_raw_parts)
    /// own no buffer and always take case 3. Note that case 2 reinterprets
    /// memory that raw-pointer wraps of the same allocation may still point
    /// into; sibling views that share the buffer safely (via
    /// [`view`](Surface::view) or `Clone`) hold a buffer reference and
    /// therefore suppress the in-place path.
    pub fn create(&mut self, width: usize, height: usize)
    where
        T: Clone + Default,
    {
        if self.cols == width && self.rows == height {
            return;
        }
        if let Some(buffer) = &self.buffer {
            if Arc::strong_count(buffer) == 1 && buffer.capacity() >= width * height {
                self.cols = width;
                self.rows = height;
                self.stride = width;
                self.origin = buffer.base_ptr();
                return;
            }
        }
        *self = Surface::new(width, height);
    }

    /// Copies the logical contents into `target`, reshaping it first via
    /// [`create`](Surface::create) (which may reuse or reallocate the
    /// target's storage).
    ///
    /// When both surfaces are contiguous the row loop collapses into a
    /// single linear copy; the resulting contents are identical either way.
    /// Copying between physically overlapping surfaces is a caller bug;
    /// consult [`is_overlapping`](Surface::is_overlapping) first.
    pub fn copy_to(&self, target: &mut Surface<T>)
    where
        T: Clone + Default,
    {
        target.create(self.cols, self.rows);

        let mut w = self.cols;
        let mut h = self.rows;
        if w == self.stride && w == target.stride {
            w *= h;
            h = 1;
        }
        if w == 0 {
            return;
        }
        for y in 0..h {
            let src = unsafe { std::slice::from_raw_parts(self.origin.add(self.stride * y), w) };
            let dst = unsafe {
                std::slice::from_raw_parts_mut(target.origin.add(target.stride * y), w)
            };
            dst.clone_from_slice(src);
        }
    }

    /// Fills every logical element with `value`; padding between rows is
    /// left untouched.
    pub fn set_to(&mut self, value: T)
    where
        T: Clone,
    {
        let mut w = self.cols;
        let mut h = self.rows;
        if w == self.stride {
            w *= h;
            h = 1;
        }
        if w == 0 {
            return;
        }
        for y in 0..h {
            let row =
                unsafe { std::slice::from_raw_parts_mut(self.origin.add(self.stride * y), w) };
            row.fill(value.clone());
        }
    }

    /// Returns a densely packed (`stride == cols`) copy of the logical
    /// contents in a freshly owned buffer, independent of this surface's
    /// storage.
    pub fn deep_clone(&self) -> Surface<T>
    where
        T: Clone + Default,
    {
        let mut out = Surface::empty();
        self.copy_to(&mut out);
        out
    }

    fn extent(&self) -> Extent {
        let elem = std::mem::size_of::<T>();
        Extent {
            addr: self.origin as usize,
            row_bytes: self.cols * elem,
            stride_bytes: self.stride * elem,
            rows: self.rows,
        }
    }
}

impl<T> Surface<T> {
    /// Byte view of the logical contents, when the surface is contiguous.
    pub fn as_bytes(&self) -> Option<&[u8]>
    where
        T: bytemuck::NoUninit,
    {
        self.as_slice().map(bytemuck::cast_slice)
    }

    /// Builds a dense owned `width x height` surface from the byte
    /// representation of its elements.
    ///
    /// The byte slice need not be aligned for `T`; elements are read
    /// unaligned and copied into fresh storage.
    pub fn from_bytes(bytes: &[u8], width: usize, height: usize) -> Result<Surface<T>>
    where
        T: bytemuck::AnyBitPattern,
    {
        planar_common::verify_arg!(element, std::mem::size_of::<T>() != 0);
        planar_common::verify_arg!(
            bytes,
            bytes.len() == width * height * std::mem::size_of::<T>()
        );
        let elems: Vec<T> = bytes
            .chunks_exact(std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        Ok(Surface::from_vec(elems, width, height))
    }
}

impl<T> Clone for Surface<T> {
    /// Cheap aliasing copy: the new handle shares the same storage and
    /// shape. Use [`deep_clone`](Surface::deep_clone) for an independent
    /// copy of the contents.
    fn clone(&self) -> Surface<T> {
        Surface {
            cols: self.cols,
            rows: self.rows,
            stride: self.stride,
            origin: self.origin,
            buffer: self.buffer.clone(),
        }
    }
}

impl<T> Default for Surface<T> {
    fn default() -> Surface<T> {
        Surface::empty()
    }
}

impl<T: PartialEq> PartialEq for Surface<T> {
    /// Logical equality: same shape, same row contents. Stride and
    /// ownership are layout facts and do not participate.
    fn eq(&self, other: &Surface<T>) -> bool {
        if self.cols != other.cols || self.rows != other.rows {
            return false;
        }
        (0..self.rows).all(|y| self.row(y) == other.row(y))
    }
}

impl<T: Eq> Eq for Surface<T> {}

impl<T> std::ops::Index<(usize, usize)> for Surface<T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        self.at(row, col)
    }
}

impl<T> std::ops::IndexMut<(usize, usize)> for Surface<T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        self.at_mut(row, col)
    }
}

impl<T> std::fmt::Debug for Surface<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("cols", &self.cols)
            .field("rows", &self.rows)
            .field("stride", &self.stride)
            .field("owned", &self.buffer.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a, T> IntoIterator for &'a Surface<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Surface<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}
